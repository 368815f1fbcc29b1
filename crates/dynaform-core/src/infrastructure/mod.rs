//! Infrastructure layer
//!
//! Adapters implementing the outbound ports.

pub mod events;
pub mod firestore;
pub mod persistence;

pub use events::{RecordingEventPublisher, TracingEventPublisher};
pub use firestore::FirestoreDocumentStore;
pub use persistence::{FileDocumentStore, InMemoryDocumentStore};
