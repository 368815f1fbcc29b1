//! Outbound ports (Document store and event publishing)
//!
//! Hexagonal architecture: these are the interfaces that infrastructure must implement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::DomainEvent;

/// Document as returned by a store query
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub data: Map<String, Value>,
}

/// Document to create.
///
/// Every field named in `server_timestamps` is set by the store to its own
/// clock at the moment the write is accepted, overriding any value in `data`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewDocument {
    pub data: Map<String, Value>,
    pub server_timestamps: Vec<String>,
}

impl NewDocument {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data, server_timestamps: vec![] }
    }

    pub fn with_server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.server_timestamps.push(field.into());
        self
    }
}

/// Filter operator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
}

/// Single-field filter
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Query against one collection.
///
/// When `order_by` is set, documents lacking that field are not returned.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub filter: FieldFilter,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    /// Documents whose `field` equals `value`
    pub fn where_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            filter: FieldFilter { field: field.into(), op: FilterOp::Equal, value: value.into() },
            order_by: None,
            limit: None,
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy { field: field.into(), direction });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Document store port
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document and return the store-assigned identifier
    async fn create(&self, collection: &str, document: NewDocument) -> Result<String, StoreError>;

    /// Run a query. No match yields an empty list, not an error.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>, StoreError>;
}

/// Event publisher port
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish domain events
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), StoreError>;
}

/// Failure originating from the document store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("query requires a missing index: {0}")]
    MissingIndex(String),

    #[error("store returned status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
