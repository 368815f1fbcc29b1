//! Inbound ports (Use case traits)
//!
//! Hexagonal architecture: application service interfaces.

use async_trait::async_trait;

use crate::application::dto::SaveSchemaCommand;
use crate::domain::aggregates::FormSchemaRevision;
use crate::domain::value_objects::RevisionId;
use crate::error::FormResult;

/// Form schema use cases
#[async_trait]
pub trait SchemaUseCases: Send + Sync {
    /// Validate and persist a new schema revision
    async fn save_schema(&self, command: SaveSchemaCommand) -> FormResult<RevisionId>;

    /// Fetch and normalize the latest revision for a form name
    async fn latest_schema(&self, form_name: &str) -> FormResult<FormSchemaRevision>;
}
