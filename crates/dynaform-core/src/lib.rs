//! Dynaform Core
//!
//! Dynamic form builder core: field definitions are validated and normalized,
//! persisted as immutable schema revisions in a document store, read back as
//! the latest revision per form name, and filled in through an input session.
//!
//! ## Architecture
//!
//! - **Domain Layer**: field descriptors, schema revisions, input sessions,
//!   validation and normalization services, domain events
//! - **Application Layer**: schema writer/reader service, polling watcher, DTOs
//! - **Ports Layer**: document store and event publisher interfaces
//! - **Infrastructure Layer**: in-memory, file and Firestore adapters
//!
//! ## Flow
//!
//! ```text
//! FieldCandidate --validate--> FieldDescriptor --create--> DocumentStore
//! DocumentStore --query latest--> raw document --normalize--> FormSchemaRevision
//! FormSchemaRevision --> FormInputSession --submit--> label -> value map
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

// Re-exports for convenience
pub use application::{SaveSchemaCommand, FieldCandidate, OptionsInput, SchemaService, SchemaWatcher, WatchHandle, WatchState};
pub use config::{DynaformConfig, StoreBackend, FirestoreConfig, ConfigError};
pub use domain::aggregates::{FieldDescriptor, FormSchemaRevision, FormInputSession, SessionState, SessionError, InputKind, SubmittedValues};
pub use domain::value_objects::{FieldType, FormName, RevisionId};
pub use domain::events::{DomainEvent, SchemaEvent, SessionEvent};
pub use domain::services::{FieldValidator, SchemaNormalizer};
pub use error::{FormError, FormResult, Operation, ValidationError};
pub use ports::inbound::SchemaUseCases;
pub use ports::outbound::{DocumentStore, EventPublisher, StoreError};

/// Collection holding schema revisions
pub const FORMS_COLLECTION: &str = "forms";
