//! In-memory document store
//!
//! Emulates the query semantics of the cloud store closely enough for tests
//! and the local backend: equality filter, single-field ordering that skips
//! documents lacking the field, limit.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::ports::outbound::{
    Direction, DocumentStore, FieldFilter, FilterOp, NewDocument, Query, StoreError, StoredDocument,
};

/// Collection name to documents in insertion order
pub type Snapshot = BTreeMap<String, Vec<StoredDocument>>;

#[derive(Clone, Debug)]
struct Entry {
    seq: u64,
    document: StoredDocument,
}

/// In-memory document store
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: DashMap<String, Vec<Entry>>,
    next_seq: AtomicU64,
    create_calls: AtomicUsize,
    query_calls: AtomicUsize,
    fault: Mutex<Option<StoreError>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store, keeping the insertion order of each collection
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        for (collection, documents) in snapshot {
            for document in documents {
                store.push(&collection, document);
            }
        }
        store
    }

    pub fn snapshot(&self) -> Snapshot {
        self.collections
            .iter()
            .map(|c| (c.key().clone(), Self::ordered(c.value())))
            .collect()
    }

    /// All documents of a collection in insertion order
    pub fn documents(&self, collection: &str) -> Vec<StoredDocument> {
        self.collections
            .get(collection)
            .map(|c| Self::ordered(c.value()))
            .unwrap_or_default()
    }

    /// Insert a raw document as-is, bypassing server timestamps
    pub fn seed(&self, collection: &str, data: Map<String, Value>) -> String {
        let id = new_document_id();
        self.push(collection, StoredDocument { id: id.clone(), data });
        id
    }

    /// Make the next `create` or `query` call fail with `error`
    pub fn inject_fault(&self, error: StoreError) {
        *self.fault.lock() = Some(error);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(AtomicOrdering::Relaxed)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(AtomicOrdering::Relaxed)
    }

    fn push(&self, collection: &str, document: StoredDocument) {
        let seq = self.next_seq.fetch_add(1, AtomicOrdering::Relaxed);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(Entry { seq, document });
    }

    fn take_fault(&self) -> Result<(), StoreError> {
        match self.fault.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn ordered(entries: &[Entry]) -> Vec<StoredDocument> {
        let mut entries = entries.to_vec();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.document).collect()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, collection: &str, document: NewDocument) -> Result<String, StoreError> {
        self.create_calls.fetch_add(1, AtomicOrdering::Relaxed);
        self.take_fault()?;

        let NewDocument { mut data, server_timestamps } = document;
        if !server_timestamps.is_empty() {
            let now = server_time();
            for field in server_timestamps {
                data.insert(field, Value::String(now.clone()));
            }
        }

        let id = new_document_id();
        self.push(collection, StoredDocument { id: id.clone(), data });
        tracing::debug!(collection, id = %id, "Created document");
        Ok(id)
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>, StoreError> {
        self.query_calls.fetch_add(1, AtomicOrdering::Relaxed);
        self.take_fault()?;

        let mut entries: Vec<Entry> = self
            .collections
            .get(collection)
            .map(|c| {
                c.iter()
                    .filter(|e| matches_filter(&e.document.data, &query.filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order_by {
            entries.retain(|e| e.document.data.contains_key(&order.field));
            entries.sort_by(|a, b| {
                let ordering = compare_values(
                    a.document.data.get(&order.field).unwrap_or(&Value::Null),
                    b.document.data.get(&order.field).unwrap_or(&Value::Null),
                )
                .then(a.seq.cmp(&b.seq));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            entries.truncate(limit);
        }

        tracing::debug!(collection, matched = entries.len(), "Queried documents");
        Ok(entries.into_iter().map(|e| e.document).collect())
    }
}

fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Fixed-width RFC 3339 so stored timestamps also sort as text
fn server_time() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn matches_filter(data: &Map<String, Value>, filter: &FieldFilter) -> bool {
    match filter.op {
        FilterOp::Equal => data.get(&filter.field) == Some(&filter.value),
    }
}

/// Values of different types order by type. Among strings, timestamps sort
/// after plain text and compare as instants.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => x.cmp(y),
        },
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value).ok().map(|t| t.with_timezone(&Utc))
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn latest(name: &str) -> Query {
        Query::where_eq("formName", name)
            .order_by("createdAt", Direction::Descending)
            .limit(1)
    }

    #[tokio::test]
    async fn test_server_timestamp_overrides_value() {
        let store = InMemoryDocumentStore::new();
        let doc = NewDocument::new(object(json!({"formName": "A", "createdAt": "client"})))
            .with_server_timestamp("createdAt");

        store.create("forms", doc).await.unwrap();

        let stored = &store.documents("forms")[0];
        let ts = stored.data["createdAt"].as_str().unwrap();
        assert!(parse_timestamp(ts).is_some());
        assert!(ts.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_equality_filter() {
        let store = InMemoryDocumentStore::new();
        store.seed("forms", object(json!({"formName": "A", "createdAt": "2024-01-01T00:00:00Z"})));
        store.seed("forms", object(json!({"formName": "B", "createdAt": "2024-01-01T00:00:00Z"})));

        let found = store.query("forms", &Query::where_eq("formName", "B")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].data["formName"], json!("B"));

        assert!(store.query("other", &Query::where_eq("formName", "B")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_descending_order_compares_instants() {
        let store = InMemoryDocumentStore::new();
        let early = store.seed("forms", object(json!({"formName": "A", "createdAt": "2024-05-01T10:00:00Z"})));
        let late = store.seed("forms", object(json!({"formName": "A", "createdAt": "2024-05-01T10:00:00.250Z"})));

        let found = store.query("forms", &latest("A")).await.unwrap();
        assert_eq!(found[0].id, late);

        let ascending = store
            .query("forms", &Query::where_eq("formName", "A").order_by("createdAt", Direction::Ascending))
            .await
            .unwrap();
        assert_eq!(ascending[0].id, early);
    }

    #[tokio::test]
    async fn test_tie_broken_by_insertion_order() {
        let store = InMemoryDocumentStore::new();
        store.seed("forms", object(json!({"formName": "A", "createdAt": "2024-05-01T10:00:00Z"})));
        let second = store.seed("forms", object(json!({"formName": "A", "createdAt": "2024-05-01T10:00:00Z"})));

        let found = store.query("forms", &latest("A")).await.unwrap();
        assert_eq!(found[0].id, second);
    }

    #[tokio::test]
    async fn test_documents_without_order_field_excluded() {
        let store = InMemoryDocumentStore::new();
        store.seed("forms", object(json!({"formName": "A"})));

        assert!(store.query("forms", &latest("A")).await.unwrap().is_empty());
        assert_eq!(store.query("forms", &Query::where_eq("formName", "A")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fault_is_one_shot() {
        let store = InMemoryDocumentStore::new();
        store.inject_fault(StoreError::Unavailable("down".into()));

        assert_eq!(
            store.query("forms", &latest("A")).await,
            Err(StoreError::Unavailable("down".into()))
        );
        assert!(store.query("forms", &latest("A")).await.is_ok());
        assert_eq!(store.query_calls(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_keeps_insertion_order() {
        let store = InMemoryDocumentStore::new();
        let first = store.seed("forms", object(json!({"n": 1})));
        let second = store.seed("forms", object(json!({"n": 2})));

        let restored = InMemoryDocumentStore::from_snapshot(store.snapshot());
        let ids: Vec<String> = restored.documents("forms").into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_cross_type_ordering() {
        assert_eq!(compare_values(&json!(null), &json!("a")), Ordering::Less);
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
    }

    #[test]
    fn test_mixed_strings_order_is_transitive() {
        let values = [
            json!("2024-06-01T00:00:00Z"),
            json!("3"),
            json!("2024-05-01T00:00:00+02:00"),
            json!("abc"),
            json!("2024-05-01T00:00:00Z"),
        ];
        for a in &values {
            for b in &values {
                for c in &values {
                    if compare_values(a, b) != Ordering::Greater && compare_values(b, c) != Ordering::Greater {
                        assert_ne!(compare_values(a, c), Ordering::Greater, "{} {} {}", a, b, c);
                    }
                }
                assert_eq!(compare_values(a, b), compare_values(b, a).reverse());
            }
        }
        assert_eq!(compare_values(&json!("2024-05-01T00:00:00Z"), &json!("zzz")), Ordering::Greater);
    }

    #[tokio::test]
    async fn test_plain_text_sorts_below_timestamps() {
        let store = InMemoryDocumentStore::new();
        store.seed("forms", object(json!({"formName": "A", "createdAt": "legacy"})));
        let stamped = store.seed("forms", object(json!({"formName": "A", "createdAt": "2020-01-01T00:00:00Z"})));

        let found = store.query("forms", &latest("A")).await.unwrap();
        assert_eq!(found[0].id, stamped);
    }
}
