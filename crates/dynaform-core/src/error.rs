//! Error types for Dynaform

use thiserror::Error;

use crate::ports::outbound::StoreError;

/// Caller-supplied schema or field data violates the shape contract.
///
/// Always raised before any store call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("formName must be a non-empty string")]
    EmptyFormName,

    #[error("fields must be a non-empty list")]
    NoFields,

    #[error("field #{index} must have a non-empty 'label'")]
    MissingLabel { index: usize },

    #[error("field \"{label}\" must have a non-empty 'type'")]
    MissingType { label: String },

    #[error("field \"{label}\" is a dropdown but options is not a list")]
    DropdownOptionsNotList { label: String },

    #[error("field \"{label}\" is a dropdown but has no options")]
    DropdownWithoutOptions { label: String },
}

/// Form error type
#[derive(Error, Debug)]
pub enum FormError {
    /// Invalid schema input
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No revision stored under the form name
    #[error("no form found for \"{form_name}\"")]
    NotFound { form_name: String },

    /// The document store call failed
    #[error("store fault: {0}")]
    StoreFault(#[from] StoreError),
}

impl FormError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_store_fault(&self) -> bool {
        matches!(self, Self::StoreFault(_))
    }

    /// Message safe to show to an end user. Store diagnostics are not exposed.
    pub fn user_message(&self, operation: Operation) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::NotFound { form_name } => format!("No form found for \"{}\".", form_name),
            Self::StoreFault(_) => match operation {
                Operation::Save => "Failed to save form.".to_string(),
                Operation::Load => "Failed to load form.".to_string(),
            },
        }
    }
}

/// Operation a [`FormError`] was raised by, used to word user messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Save,
    Load,
}

/// Result type for Dynaform
pub type FormResult<T> = Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_fault_message_hides_diagnostics() {
        let err = FormError::StoreFault(StoreError::Transport("connection reset by 10.0.0.7".into()));
        let msg = err.user_message(Operation::Save);
        assert_eq!(msg, "Failed to save form.");
        assert!(!msg.contains("10.0.0.7"));
        assert!(err.to_string().contains("10.0.0.7"));
    }

    #[test]
    fn test_validation_message_names_field() {
        let err: FormError = ValidationError::MissingType { label: "Age".into() }.into();
        assert!(err.is_validation());
        assert!(err.user_message(Operation::Save).contains("\"Age\""));
    }

    #[test]
    fn test_not_found_is_distinguishable() {
        let err = FormError::NotFound { form_name: "Signup".into() };
        assert!(err.is_not_found());
        assert!(!err.is_store_fault());
    }
}
