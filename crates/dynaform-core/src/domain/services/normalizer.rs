//! Schema Normalizer
//!
//! Converts stored revision documents into the canonical
//! [`FormSchemaRevision`] shape. Legacy shapes are tolerated: `fields` stored
//! as a keyed mapping, missing labels or types, options stored as a
//! comma-separated string. Structurally broken documents are rejected.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::aggregates::{FieldDescriptor, FormSchemaRevision};
use crate::domain::value_objects::{FieldType, FormName, RevisionId};
use crate::ports::outbound::StoreError;

/// Stored document keys
pub const FORM_NAME_KEY: &str = "formName";
pub const FIELDS_KEY: &str = "fields";
pub const CREATED_AT_KEY: &str = "createdAt";

/// Schema normalization service
pub struct SchemaNormalizer;

impl SchemaNormalizer {
    /// Normalize a stored revision. `queried_name` is used when the document
    /// itself carries no usable form name.
    pub fn normalize(
        id: &str,
        data: &Map<String, Value>,
        queried_name: &str,
    ) -> Result<FormSchemaRevision, StoreError> {
        let form_name = match data.get(FORM_NAME_KEY) {
            Some(Value::String(name)) if !name.is_empty() => FormName::new_unchecked(name.clone()),
            _ => FormName::new_unchecked(queried_name),
        };

        let created_at = Self::parse_timestamp(data.get(CREATED_AT_KEY))
            .ok_or_else(|| StoreError::Malformed(format!("document {} has no valid {}", id, CREATED_AT_KEY)))?;

        let fields = Self::normalize_fields(data.get(FIELDS_KEY))
            .map_err(|reason| StoreError::Malformed(format!("document {}: {}", id, reason)))?;

        Ok(FormSchemaRevision::new(
            RevisionId::from_string(id),
            form_name,
            fields,
            created_at,
        ))
    }

    /// Normalize the stored `fields` value into an ordered field list
    pub fn normalize_fields(value: Option<&Value>) -> Result<Vec<FieldDescriptor>, String> {
        let entries: Vec<&Value> = match value {
            None | Some(Value::Null) => vec![],
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Object(map)) => Self::keyed_values(map),
            Some(other) => return Err(format!("fields must be a list or mapping, found {}", type_name(other))),
        };

        entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| match entry {
                Value::Object(field) => Ok(Self::normalize_field(field)),
                other => Err(format!("field #{} must be an object, found {}", i, type_name(other))),
            })
            .collect()
    }

    /// Fill defaults for one stored field
    pub fn normalize_field(field: &Map<String, Value>) -> FieldDescriptor {
        let label = match field.get("label") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        };

        let field_type = match field.get("type") {
            Some(Value::String(s)) if !s.is_empty() => FieldType::parse(s),
            _ => FieldType::Text,
        };

        FieldDescriptor {
            label,
            field_type,
            options: Self::normalize_options(field.get("options")),
        }
    }

    /// Lists pass through, strings are split on commas, anything else is empty
    pub fn normalize_options(value: Option<&Value>) -> Vec<String> {
        match value {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => s.split(',').map(|o| o.trim().to_string()).collect(),
            _ => vec![],
        }
    }

    /// Values of a keyed mapping, keys discarded. Array-index keys come
    /// first in numeric order, then the remaining keys in map order.
    fn keyed_values(map: &Map<String, Value>) -> Vec<&Value> {
        let mut indexed: Vec<(u32, &Value)> = vec![];
        let mut named: Vec<&Value> = vec![];
        for (key, value) in map {
            match array_index(key) {
                Some(i) => indexed.push((i, value)),
                None => named.push(value),
            }
        }
        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, v)| v).chain(named).collect()
    }

    fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
        match value {
            Some(Value::String(s)) => DateTime::parse_from_rfc3339(s).ok().map(|t| t.with_timezone(&Utc)),
            _ => None,
        }
    }
}

/// Canonical array index: decimal digits without leading zeros, below 2^32 - 1
fn array_index(key: &str) -> Option<u32> {
    let n: u32 = key.parse().ok()?;
    (n != u32::MAX && n.to_string() == key).then_some(n)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
