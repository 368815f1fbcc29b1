//! Firestore typed-value codec
//!
//! Converts between plain JSON and the `Value` representation of the
//! Firestore REST API.

use serde_json::{json, Map, Value};

use crate::ports::outbound::{StoreError, StoredDocument};

/// Plain JSON to Firestore `Value`
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            // int64 travels as a decimal string
            (Some(i), _) => json!({ "integerValue": i.to_string() }),
            (None, Some(f)) => json!({ "doubleValue": f }),
            (None, None) => json!({ "nullValue": null }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect()
}

/// Firestore `Value` to plain JSON. Timestamps become RFC 3339 strings.
pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let Some((kind, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Err(StoreError::Malformed(format!("expected a typed value, found {}", value)));
    };

    match (kind.as_str(), inner) {
        ("nullValue", _) => Ok(Value::Null),
        ("booleanValue", Value::Bool(b)) => Ok(Value::Bool(*b)),
        ("integerValue", Value::String(s)) => s
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| StoreError::Malformed(format!("integerValue '{}': {}", s, e))),
        ("integerValue", Value::Number(n)) => Ok(Value::Number(n.clone())),
        ("doubleValue", Value::Number(n)) => Ok(Value::Number(n.clone())),
        // NaN and infinities have no JSON form
        ("doubleValue", Value::String(_)) => Ok(Value::Null),
        ("stringValue", Value::String(s))
        | ("timestampValue", Value::String(s))
        | ("referenceValue", Value::String(s))
        | ("bytesValue", Value::String(s)) => Ok(Value::String(s.clone())),
        ("geoPointValue", Value::Object(point)) => Ok(json!({
            "latitude": point.get("latitude").cloned().unwrap_or(Value::from(0)),
            "longitude": point.get("longitude").cloned().unwrap_or(Value::from(0)),
        })),
        ("arrayValue", Value::Object(array)) => match array.get("values") {
            Some(Value::Array(values)) => values.iter().map(decode_value).collect::<Result<Vec<_>, _>>().map(Value::Array),
            _ => Ok(Value::Array(vec![])),
        },
        ("mapValue", Value::Object(map)) => match map.get("fields") {
            Some(Value::Object(fields)) => decode_fields(fields).map(Value::Object),
            _ => Ok(Value::Object(Map::new())),
        },
        (kind, inner) => Err(StoreError::Malformed(format!("unsupported value {}: {}", kind, inner))),
    }
}

pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, StoreError> {
    fields
        .iter()
        .map(|(k, v)| decode_value(v).map(|v| (k.clone(), v)))
        .collect()
}

/// Decode a REST `Document`; the id is the last segment of its name
pub fn decode_document(document: &Value) -> Result<StoredDocument, StoreError> {
    let name = document
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Malformed("document without a name".into()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();

    let data = match document.get("fields") {
        Some(Value::Object(fields)) => decode_fields(fields)?,
        None => Map::new(),
        Some(other) => return Err(StoreError::Malformed(format!("document {} has invalid fields: {}", id, other))),
    };

    Ok(StoredDocument { id, data })
}

/// Field path segment, backquoted unless it is a simple identifier
pub fn field_path(field: &str) -> String {
    let simple = field
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
        && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        field.to_string()
    } else {
        format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
    }
}
