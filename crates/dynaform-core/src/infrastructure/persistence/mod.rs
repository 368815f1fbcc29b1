//! Local document store implementations

mod file;
mod memory;

pub use file::FileDocumentStore;
pub use memory::{InMemoryDocumentStore, Snapshot};
