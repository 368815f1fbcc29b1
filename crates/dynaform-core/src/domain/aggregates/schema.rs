//! Schema Revision Aggregate
//!
//! One immutable, timestamped snapshot of a form's field list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::value_objects::{FieldType, FormName, RevisionId};

/// Definition of one input
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub options: Vec<String>,
}

/// How a field is presented for input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind<'a> {
    /// Choice among a fixed list
    Select(&'a [String]),
    /// Free-form input of the given type
    Input(&'a str),
}

impl FieldDescriptor {
    pub fn new(label: impl Into<String>, field_type: FieldType) -> Self {
        Self { label: label.into(), field_type, options: vec![] }
    }

    pub fn dropdown<I, S>(label: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            field_type: FieldType::Dropdown,
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// A dropdown without options falls back to a plain input
    pub fn input_kind(&self) -> InputKind<'_> {
        if self.field_type.is_dropdown() && !self.options.is_empty() {
            InputKind::Select(&self.options)
        } else {
            InputKind::Input(self.field_type.html_input_type())
        }
    }

    /// Stored shape of the field
    pub fn to_document(&self) -> Value {
        json!({
            "label": self.label,
            "type": self.field_type.as_str(),
            "options": self.options,
        })
    }
}

/// Schema revision aggregate root
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchemaRevision {
    id: RevisionId,
    form_name: FormName,
    fields: Vec<FieldDescriptor>,
    created_at: DateTime<Utc>,
}

impl FormSchemaRevision {
    pub fn new(
        id: RevisionId,
        form_name: FormName,
        fields: Vec<FieldDescriptor>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self { id, form_name, fields, created_at }
    }

    pub fn id(&self) -> &RevisionId { &self.id }
    pub fn form_name(&self) -> &FormName { &self.form_name }
    pub fn fields(&self) -> &[FieldDescriptor] { &self.fields }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// First field carrying the label
    pub fn field(&self, label: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropdown_renders_as_select() {
        let field = FieldDescriptor::dropdown("Role", ["Admin", "User"]);
        match field.input_kind() {
            InputKind::Select(opts) => assert_eq!(opts, ["Admin".to_string(), "User".to_string()]),
            other => panic!("expected select, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_dropdown_falls_back_to_input() {
        let field = FieldDescriptor::new("Role", FieldType::Dropdown);
        assert_eq!(field.input_kind(), InputKind::Input("dropdown"));
    }

    #[test]
    fn test_document_shape() {
        let field = FieldDescriptor::new("Name", FieldType::Text);
        assert_eq!(field.to_document(), json!({"label": "Name", "type": "text", "options": []}));
    }

    #[test]
    fn test_field_lookup_by_label() {
        let rev = FormSchemaRevision::new(
            RevisionId::new(),
            FormName::new_unchecked("Signup"),
            vec![FieldDescriptor::new("Name", FieldType::Text), FieldDescriptor::new("Age", FieldType::Number)],
            Utc::now(),
        );
        assert_eq!(rev.field("Age").map(|f| &f.field_type), Some(&FieldType::Number));
        assert!(rev.field("Missing").is_none());
    }
}
