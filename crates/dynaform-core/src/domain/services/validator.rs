//! Field Descriptor Validator
//!
//! Checks candidate field definitions and normalizes them into fresh
//! [`FieldDescriptor`] values. Candidates are never modified.

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::FieldDescriptor;
use crate::domain::value_objects::FieldType;
use crate::error::ValidationError;

/// Dropdown options as supplied by the caller
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionsInput {
    /// Comma-separated list, e.g. `"Admin, User"`
    Csv(String),
    List(Vec<String>),
    /// Anything else; rejected for dropdowns
    Other(serde_json::Value),
}

/// Unvalidated field definition
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldCandidate {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionsInput>,
}

impl FieldCandidate {
    pub fn new(label: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            field_type: Some(field_type.into()),
            options: None,
        }
    }

    pub fn with_options(mut self, options: OptionsInput) -> Self {
        self.options = Some(options);
        self
    }
}

/// Field descriptor validation service
pub struct FieldValidator;

impl FieldValidator {
    /// Validate one candidate. `index` is its position in the schema and is
    /// only used to name a field that has no label.
    pub fn validate(index: usize, candidate: &FieldCandidate) -> Result<FieldDescriptor, ValidationError> {
        let label = match candidate.label.as_deref() {
            Some(l) if !l.trim().is_empty() => l,
            _ => return Err(ValidationError::MissingLabel { index }),
        };

        let field_type = match candidate.field_type.as_deref() {
            Some(t) if !t.trim().is_empty() => FieldType::parse(t),
            _ => return Err(ValidationError::MissingType { label: label.to_string() }),
        };

        let options = if field_type.is_dropdown() {
            let options = match &candidate.options {
                Some(OptionsInput::Csv(csv)) => Self::split_options(csv),
                Some(OptionsInput::List(list)) => list
                    .iter()
                    .map(|o| o.trim())
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect(),
                Some(OptionsInput::Other(_)) | None => {
                    return Err(ValidationError::DropdownOptionsNotList { label: label.to_string() })
                }
            };
            if options.is_empty() {
                return Err(ValidationError::DropdownWithoutOptions { label: label.to_string() });
            }
            options
        } else {
            vec![]
        };

        Ok(FieldDescriptor {
            label: label.to_string(),
            field_type,
            options,
        })
    }

    /// Validate a whole field list, failing on the first invalid field
    pub fn validate_all(candidates: &[FieldCandidate]) -> Result<Vec<FieldDescriptor>, ValidationError> {
        if candidates.is_empty() {
            return Err(ValidationError::NoFields);
        }
        candidates
            .iter()
            .enumerate()
            .map(|(i, c)| Self::validate(i, c))
            .collect()
    }

    /// Split on commas, trim each segment and drop empty ones
    pub fn split_options(csv: &str) -> Vec<String> {
        csv.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
