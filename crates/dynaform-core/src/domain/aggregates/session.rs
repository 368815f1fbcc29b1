//! Form Input Session Aggregate
//!
//! Tracks per-field input values for one rendering of a schema revision and
//! produces the submitted value map. Sessions are transient and never
//! persisted.

use chrono::Utc;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::aggregates::schema::{FormSchemaRevision, InputKind};
use crate::domain::events::{DomainEvent, SessionEvent};
use crate::domain::value_objects::FormName;
use crate::error::{FormResult, Operation};

/// Label to raw input value
pub type SubmittedValues = BTreeMap<String, String>;

/// Session lifecycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Ready,
    Submitted,
    NotFound,
    /// Load failed; carries a user-facing message only
    Error(String),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Submitted => "submitted",
            Self::NotFound => "not_found",
            Self::Error(_) => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted | Self::NotFound | Self::Error(_))
    }
}

/// Form input session aggregate root
#[derive(Clone, Debug)]
pub struct FormInputSession {
    form_name: FormName,
    state: SessionState,
    schema: Option<FormSchemaRevision>,
    values: SubmittedValues,
    events: Vec<DomainEvent>,
}

impl FormInputSession {
    /// Start a session waiting for its schema
    pub fn new(form_name: FormName) -> Self {
        Self {
            form_name,
            state: SessionState::Loading,
            schema: None,
            values: BTreeMap::new(),
            events: vec![],
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn form_name(&self) -> &FormName { &self.form_name }
    pub fn state(&self) -> &SessionState { &self.state }
    pub fn schema(&self) -> Option<&FormSchemaRevision> { self.schema.as_ref() }
    pub fn values(&self) -> &SubmittedValues { &self.values }

    /// Current value for a label, empty when never edited
    pub fn value(&self, label: &str) -> &str {
        self.values.get(label).map(String::as_str).unwrap_or("")
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Feed the outcome of a schema read into the session.
    ///
    /// While ready, a newer schema replaces the current one and values for
    /// labels that still exist are kept; a failed refresh keeps the current
    /// schema. Terminal states ignore further loads.
    pub fn apply_load(&mut self, result: FormResult<FormSchemaRevision>) {
        if self.state == SessionState::Loading {
            match result {
                Ok(schema) => {
                    self.schema = Some(schema);
                    self.state = SessionState::Ready;
                }
                Err(e) if e.is_not_found() => {
                    self.state = SessionState::NotFound;
                }
                Err(e) => {
                    self.state = SessionState::Error(e.user_message(Operation::Load));
                }
            }
        } else if self.state == SessionState::Ready {
            match result {
                Ok(schema) => {
                    self.values.retain(|label, _| schema.field(label).is_some());
                    self.schema = Some(schema);
                }
                Err(e) => {
                    tracing::warn!(form = %self.form_name, error = %e, "Schema refresh failed, keeping current schema");
                }
            }
        }
    }

    /// Record the raw input for a field. No coercion against the field type
    /// is performed; select fields only accept one of their options or "".
    pub fn set_value(&mut self, label: &str, value: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let schema = self.schema.as_ref().ok_or(SessionError::NotReady { state: "loading" })?;
        let field = schema
            .field(label)
            .ok_or_else(|| SessionError::UnknownField(label.to_string()))?;

        let value = value.into();
        if let InputKind::Select(options) = field.input_kind() {
            if !value.is_empty() && !options.iter().any(|o| *o == value) {
                return Err(SessionError::InvalidOption { label: label.to_string(), value });
            }
        }

        self.values.insert(label.to_string(), value);
        Ok(())
    }

    /// Capture the current values as the final output. Terminal.
    pub fn submit(&mut self) -> Result<SubmittedValues, SessionError> {
        self.ensure_ready()?;
        let submitted = self.values.clone();

        if let Some(schema) = &self.schema {
            self.events.push(DomainEvent::Session(SessionEvent::Submitted {
                form_name: self.form_name.clone(),
                revision_id: schema.id().clone(),
                value_count: submitted.len(),
                submitted_at: Utc::now(),
            }));
        }
        self.state = SessionState::Submitted;

        Ok(submitted)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn ensure_ready(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Submitted => Err(SessionError::AlreadySubmitted),
            ref other => Err(SessionError::NotReady { state: other.name() }),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session is not ready (state: {state})")]
    NotReady { state: &'static str },

    #[error("session already submitted")]
    AlreadySubmitted,

    #[error("unknown field \"{0}\"")]
    UnknownField(String),

    #[error("\"{value}\" is not an option of field \"{label}\"")]
    InvalidOption { label: String, value: String },
}
