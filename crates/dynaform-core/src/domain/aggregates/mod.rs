//! Aggregates module

pub mod schema;
pub mod session;

pub use schema::{FieldDescriptor, FormSchemaRevision, InputKind};
pub use session::{FormInputSession, SessionError, SessionState, SubmittedValues};
