//! CLI Commands

pub mod config;
pub mod fill;
pub mod save;
pub mod show;
pub mod watch;

use anyhow::Context as _;
use std::sync::Arc;

use dynaform_core::infrastructure::{
    FileDocumentStore, FirestoreDocumentStore, InMemoryDocumentStore, TracingEventPublisher,
};
use dynaform_core::{DocumentStore, DynaformConfig, SchemaService, StoreBackend};

use crate::output::OutputFormat;

/// Per-invocation state shared by the commands
pub struct Context {
    pub config: DynaformConfig,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(config: DynaformConfig, format: OutputFormat) -> Self {
        Self { config, format }
    }

    /// Document store selected by the configuration
    pub async fn store(&self) -> anyhow::Result<Arc<dyn DocumentStore>> {
        let store: Arc<dyn DocumentStore> = match self.config.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory backend; nothing is kept after exit");
                Arc::new(InMemoryDocumentStore::new())
            }
            StoreBackend::Local => {
                let path = self
                    .config
                    .local_path
                    .clone()
                    .context("local_path is not configured")?;
                Arc::new(FileDocumentStore::open(path).await?)
            }
            StoreBackend::Firestore => Arc::new(FirestoreDocumentStore::new(&self.config.firestore)),
        };
        tracing::debug!(backend = %self.config.backend, collection = %self.config.collection, "Store ready");
        Ok(store)
    }

    pub async fn service(&self) -> anyhow::Result<Arc<SchemaService>> {
        let service = SchemaService::new(self.store().await?, Arc::new(TracingEventPublisher))
            .with_collection(self.config.collection.clone());
        Ok(Arc::new(service))
    }
}
