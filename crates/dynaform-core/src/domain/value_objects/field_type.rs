//! Field Type Value Object
//!
//! Open enumeration of input types. Unknown type strings are preserved
//! verbatim and rendered as a generic text input.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Type of a form field
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
    Email,
    Dropdown,
    /// Any other type string, treated as a generic text input
    Other(String),
}

impl FieldType {
    /// Parse a type string; never fails
    pub fn parse(value: &str) -> Self {
        match value {
            "text" => Self::Text,
            "number" => Self::Number,
            "date" => Self::Date,
            "email" => Self::Email,
            "dropdown" => Self::Dropdown,
            other => Self::Other(other.to_string()),
        }
    }

    /// Stored string form
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Email => "email",
            Self::Dropdown => "dropdown",
            Self::Other(s) => s,
        }
    }

    pub fn is_dropdown(&self) -> bool {
        matches!(self, Self::Dropdown)
    }

    /// Input type used when the field is rendered as a plain input
    pub fn html_input_type(&self) -> &str {
        match self.as_str() {
            "" => "text",
            s => s,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FieldType {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}
