//! Data Transfer Objects (DTOs)
//!
//! Objects for transferring data across boundaries.

use serde::{Deserialize, Serialize};

pub use crate::domain::services::validator::{FieldCandidate, OptionsInput};

// =============================================================================
// Schema Commands
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSchemaCommand {
    pub form_name: String,
    pub fields: Vec<FieldCandidate>,
}

impl SaveSchemaCommand {
    pub fn new(form_name: impl Into<String>, fields: Vec<FieldCandidate>) -> Self {
        Self { form_name: form_name.into(), fields }
    }
}

// =============================================================================
// Views (Read Models)
// =============================================================================

/// One row of a schema listing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldView {
    pub position: usize,
    pub label: String,
    pub field_type: String,
    pub options: String,
}

impl FieldView {
    pub fn from_schema(schema: &crate::domain::FormSchemaRevision) -> Vec<Self> {
        schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, f)| Self {
                position: i + 1,
                label: f.label.clone(),
                field_type: f.field_type.to_string(),
                options: f.options.join(", "),
            })
            .collect()
    }
}
