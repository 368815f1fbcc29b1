//! Domain Events
//!
//! Events raised when a schema revision is published or a form is submitted.

use chrono::{DateTime, Utc};

use crate::domain::value_objects::{FormName, RevisionId};

/// All domain events in the form builder context
#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Schema(SchemaEvent),
    Session(SessionEvent),
}

/// Schema-related domain events
#[derive(Clone, Debug, PartialEq)]
pub enum SchemaEvent {
    Published {
        revision_id: RevisionId,
        form_name: FormName,
        field_count: usize,
        published_at: DateTime<Utc>,
    },
}

/// Input session domain events
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Submitted {
        form_name: FormName,
        revision_id: RevisionId,
        value_count: usize,
        submitted_at: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Form the event belongs to
    pub fn form_name(&self) -> &FormName {
        match self {
            DomainEvent::Schema(SchemaEvent::Published { form_name, .. }) => form_name,
            DomainEvent::Session(SessionEvent::Submitted { form_name, .. }) => form_name,
        }
    }

    /// Get event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::Schema(SchemaEvent::Published { .. }) => "schema.published",
            DomainEvent::Session(SessionEvent::Submitted { .. }) => "session.submitted",
        }
    }
}
