//! Application layer
//!
//! Orchestrates use cases and coordinates domain objects.

pub mod commands;
pub mod dto;
pub mod watcher;

pub use commands::SchemaService;
pub use dto::*;
pub use watcher::{SchemaWatcher, WatchHandle, WatchState};
