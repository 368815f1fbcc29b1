//! Cloud Firestore adapter
//!
//! Talks to the Firestore REST v1 API: `documents:commit` for creates and
//! `documents:runQuery` for structured queries.

pub mod codec;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::FirestoreConfig;
use crate::ports::outbound::{
    Direction, DocumentStore, FilterOp, NewDocument, Query, StoreError, StoredDocument,
};

/// Firestore document store
pub struct FirestoreDocumentStore {
    client: Client,
    base_url: String,
    project_id: String,
    database: String,
    api_key: Option<String>,
}

impl FirestoreDocumentStore {
    pub fn new(config: &FirestoreConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &FirestoreConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            database: config.database.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// `projects/{project}/databases/{database}/documents`
    fn documents_root(&self) -> String {
        format!("projects/{}/databases/{}/documents", self.project_id, self.database)
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, self.documents_root(), method)
    }

    async fn post(&self, method: &str, body: &Value) -> Result<Value, StoreError> {
        tracing::debug!(method, project = %self.project_id, "Firestore request");

        let mut request = self.client.post(self.url(method)).json(body);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(map_error(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| StoreError::Malformed(format!("{} response: {}", method, e)))
    }

    fn commit_body(&self, collection: &str, id: &str, document: &NewDocument) -> Value {
        let mut fields = document.data.clone();
        for field in &document.server_timestamps {
            fields.remove(field);
        }

        let transforms: Vec<Value> = document
            .server_timestamps
            .iter()
            .map(|field| json!({ "fieldPath": codec::field_path(field), "setToServerValue": "REQUEST_TIME" }))
            .collect();

        json!({
            "writes": [{
                "update": {
                    "name": format!("{}/{}/{}", self.documents_root(), collection, id),
                    "fields": codec::encode_fields(&fields),
                },
                "currentDocument": { "exists": false },
                "updateTransforms": transforms,
            }]
        })
    }
}

/// Structured query body for `runQuery`
fn query_body(collection: &str, query: &Query) -> Value {
    let op = match query.filter.op {
        FilterOp::Equal => "EQUAL",
    };

    let mut structured = json!({
        "from": [{ "collectionId": collection }],
        "where": {
            "fieldFilter": {
                "field": { "fieldPath": codec::field_path(&query.filter.field) },
                "op": op,
                "value": codec::encode_value(&query.filter.value),
            }
        },
    });

    if let Some(order) = &query.order_by {
        let direction = match order.direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured["orderBy"] = json!([{
            "field": { "fieldPath": codec::field_path(&order.field) },
            "direction": direction,
        }]);
    }
    if let Some(limit) = query.limit {
        structured["limit"] = json!(limit);
    }

    json!({ "structuredQuery": structured })
}

/// The request URL carries the API key and is left out of the message
fn transport_error(error: reqwest::Error) -> StoreError {
    StoreError::Transport(error.without_url().to_string())
}

/// Map a non-2xx response. The body is a `google.rpc.Status` wrapper, or a
/// list of them for streamed methods.
fn map_error(code: u16, body: &str) -> StoreError {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let error = match &parsed {
        Value::Array(items) => items.iter().find_map(|i| i.get("error")),
        other => other.get("error"),
    };

    let status = error.and_then(|e| e.get("status")).and_then(Value::as_str).unwrap_or("");
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());

    if code == 403 || status == "PERMISSION_DENIED" {
        StoreError::PermissionDenied(message)
    } else if status == "FAILED_PRECONDITION" && message.to_lowercase().contains("index") {
        StoreError::MissingIndex(message)
    } else {
        StoreError::Status { code, message }
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn create(&self, collection: &str, document: NewDocument) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let body = self.commit_body(collection, &id, &document);

        self.post("commit", &body).await?;
        tracing::debug!(collection, id = %id, "Committed document");
        Ok(id)
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>, StoreError> {
        let response = self.post("runQuery", &query_body(collection, query)).await?;

        let Value::Array(items) = response else {
            return Err(StoreError::Malformed("runQuery response is not a list".into()));
        };

        // Entries without a document only carry progress information
        items
            .iter()
            .filter_map(|item| item.get("document"))
            .map(codec::decode_document)
            .collect()
    }
}
