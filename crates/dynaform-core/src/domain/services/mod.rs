//! Domain services module
//!
//! - [`FieldValidator`]: caller input to canonical field descriptors
//! - [`SchemaNormalizer`]: stored, possibly legacy-shaped documents to schema revisions

pub mod normalizer;
pub mod validator;

pub use normalizer::SchemaNormalizer;
pub use validator::{FieldCandidate, FieldValidator, OptionsInput};
