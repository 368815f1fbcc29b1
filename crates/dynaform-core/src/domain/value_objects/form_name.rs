//! Form Name Value Object
//!
//! Logical form identifier shared by all revisions of one form.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Non-empty form name
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormName(String);

impl FormName {
    /// Create a validated form name. The name is stored as given; only
    /// all-whitespace names are rejected.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyFormName);
        }
        Ok(Self(value))
    }

    /// Create without validation (for names read back from the store)
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FormName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_form_name() {
        let name = FormName::new("User Registration").unwrap();
        assert_eq!(name.as_str(), "User Registration");
    }

    #[test]
    fn test_empty_form_name() {
        assert!(matches!(FormName::new(""), Err(ValidationError::EmptyFormName)));
        assert!(matches!(FormName::new("   "), Err(ValidationError::EmptyFormName)));
    }
}
