//! Command handlers
//!
//! Application service implementing the schema writer and reader.

use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};

use crate::application::dto::SaveSchemaCommand;
use crate::domain::aggregates::{FieldDescriptor, FormSchemaRevision};
use crate::domain::events::{DomainEvent, SchemaEvent};
use crate::domain::services::normalizer::{CREATED_AT_KEY, FIELDS_KEY, FORM_NAME_KEY};
use crate::domain::services::{FieldValidator, SchemaNormalizer};
use crate::domain::value_objects::{FormName, RevisionId};
use crate::error::{FormError, FormResult};
use crate::ports::inbound::SchemaUseCases;
use crate::ports::outbound::{Direction, DocumentStore, EventPublisher, NewDocument, Query};

/// Schema application service
pub struct SchemaService {
    store: Arc<dyn DocumentStore>,
    event_publisher: Arc<dyn EventPublisher>,
    collection: String,
}

impl SchemaService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            event_publisher,
            collection: crate::FORMS_COLLECTION.to_string(),
        }
    }

    /// Use a collection other than `forms`
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn build_document(form_name: &FormName, fields: &[FieldDescriptor]) -> NewDocument {
        let mut data = Map::new();
        data.insert(FORM_NAME_KEY.to_string(), Value::String(form_name.as_str().to_string()));
        data.insert(
            FIELDS_KEY.to_string(),
            Value::Array(fields.iter().map(FieldDescriptor::to_document).collect()),
        );
        NewDocument::new(data).with_server_timestamp(CREATED_AT_KEY)
    }
}

#[async_trait]
impl SchemaUseCases for SchemaService {
    async fn save_schema(&self, command: SaveSchemaCommand) -> FormResult<RevisionId> {
        // Validate before touching the store
        let form_name = FormName::new(command.form_name)?;
        let fields = FieldValidator::validate_all(&command.fields).map_err(|e| {
            tracing::debug!(form = %form_name, error = %e, "Rejected form schema");
            e
        })?;

        let document = Self::build_document(&form_name, &fields);
        let id = self.store.create(&self.collection, document).await.map_err(|e| {
            tracing::error!(form = %form_name, collection = %self.collection, error = %e, "Error saving form");
            FormError::StoreFault(e)
        })?;

        let revision_id = RevisionId::from_string(id);
        tracing::info!(form = %form_name, id = %revision_id, fields = fields.len(), "Form saved");

        // The revision is durable at this point; a publishing failure is only reported
        let event = DomainEvent::Schema(SchemaEvent::Published {
            revision_id: revision_id.clone(),
            form_name,
            field_count: fields.len(),
            published_at: Utc::now(),
        });
        if let Err(e) = self.event_publisher.publish(vec![event]).await {
            tracing::warn!(id = %revision_id, error = %e, "Failed to publish schema event");
        }

        Ok(revision_id)
    }

    async fn latest_schema(&self, form_name: &str) -> FormResult<FormSchemaRevision> {
        let query = Query::where_eq(FORM_NAME_KEY, form_name)
            .order_by(CREATED_AT_KEY, Direction::Descending)
            .limit(1);

        let documents = self.store.query(&self.collection, &query).await.map_err(|e| {
            tracing::error!(form = %form_name, collection = %self.collection, error = %e, "Error fetching form");
            FormError::StoreFault(e)
        })?;

        let Some(document) = documents.into_iter().next() else {
            tracing::warn!(form = %form_name, "No recent form found");
            return Err(FormError::NotFound { form_name: form_name.to_string() });
        };

        SchemaNormalizer::normalize(&document.id, &document.data, form_name).map_err(|e| {
            tracing::error!(form = %form_name, id = %document.id, error = %e, "Stored form is malformed");
            FormError::StoreFault(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::{FieldCandidate, OptionsInput};
    use crate::domain::value_objects::FieldType;
    use crate::infrastructure::events::RecordingEventPublisher;
    use crate::infrastructure::persistence::InMemoryDocumentStore;
    use crate::ports::outbound::StoreError;
    use crate::error::ValidationError;
    use proptest::prelude::*;
    use serde_json::json;

    fn service() -> (SchemaService, Arc<InMemoryDocumentStore>, Arc<RecordingEventPublisher>) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let publisher = Arc::new(RecordingEventPublisher::new());
        (SchemaService::new(store.clone(), publisher.clone()), store, publisher)
    }

    fn signup_command() -> SaveSchemaCommand {
        SaveSchemaCommand::new(
            "Signup",
            vec![
                FieldCandidate::new("Name", "text"),
                FieldCandidate::new("Role", "dropdown").with_options(OptionsInput::Csv("Admin,User".into())),
            ],
        )
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_save_then_read_signup() {
        let (service, _, _) = service();

        let id = service.save_schema(signup_command()).await.unwrap();
        let schema = service.latest_schema("Signup").await.unwrap();

        assert_eq!(schema.id(), &id);
        assert_eq!(
            schema.fields(),
            &[
                FieldDescriptor::new("Name", FieldType::Text),
                FieldDescriptor::dropdown("Role", ["Admin", "User"]),
            ]
        );
    }

    #[tokio::test]
    async fn test_stored_document_shape() {
        let (service, store, _) = service();
        service.save_schema(signup_command()).await.unwrap();

        let stored = store.documents("forms");
        assert_eq!(stored.len(), 1);
        let data = &stored[0].data;
        assert_eq!(data["formName"], json!("Signup"));
        assert_eq!(data["fields"][1], json!({"label": "Role", "type": "dropdown", "options": ["Admin", "User"]}));
        assert!(data["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_invalid_field_never_reaches_store() {
        let (service, store, publisher) = service();
        let command = SaveSchemaCommand::new(
            "Signup",
            vec![FieldCandidate { label: Some("Age".into()), field_type: None, options: None }],
        );

        let err = service.save_schema(command).await.unwrap_err();
        assert!(matches!(err, FormError::Validation(ValidationError::MissingType { .. })));
        assert_eq!(store.create_calls(), 0);
        assert!(publisher.events().is_empty());
    }

    #[tokio::test]
    async fn test_empty_name_and_empty_fields_rejected() {
        let (service, store, _) = service();

        let err = service.save_schema(SaveSchemaCommand::new("", vec![FieldCandidate::new("A", "text")])).await.unwrap_err();
        assert!(matches!(err, FormError::Validation(ValidationError::EmptyFormName)));

        let err = service.save_schema(SaveSchemaCommand::new("Signup", vec![])).await.unwrap_err();
        assert!(matches!(err, FormError::Validation(ValidationError::NoFields)));

        assert_eq!(store.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_form_not_found() {
        let (service, store, _) = service();
        service.save_schema(signup_command()).await.unwrap();

        let err = service.latest_schema("Contact").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.query_calls(), 1);
    }

    #[tokio::test]
    async fn test_latest_revision_wins() {
        let (service, store, _) = service();
        for (name, ts) in [
            ("Old", "2024-01-01T00:00:00Z"),
            ("Newest", "2024-03-01T00:00:00.5Z"),
            ("Middle", "2024-02-01T00:00:00Z"),
        ] {
            store.seed("forms", object(json!({
                "formName": "Signup",
                "createdAt": ts,
                "fields": [{"label": name, "type": "text"}],
            })));
        }
        store.seed("forms", object(json!({
            "formName": "Other",
            "createdAt": "2025-01-01T00:00:00Z",
            "fields": [{"label": "Other", "type": "text"}],
        })));

        let schema = service.latest_schema("Signup").await.unwrap();
        assert_eq!(schema.fields()[0].label, "Newest");
    }

    #[tokio::test]
    async fn test_consecutive_saves_read_back_last() {
        let (service, _, _) = service();
        service.save_schema(SaveSchemaCommand::new("Signup", vec![FieldCandidate::new("First", "text")])).await.unwrap();
        let second = service.save_schema(SaveSchemaCommand::new("Signup", vec![FieldCandidate::new("Second", "text")])).await.unwrap();

        let schema = service.latest_schema("Signup").await.unwrap();
        assert_eq!(schema.id(), &second);
    }

    #[tokio::test]
    async fn test_legacy_keyed_fields() {
        let (service, store, _) = service();
        store.seed("forms", object(json!({
            "formName": "Legacy",
            "createdAt": "2024-01-01T00:00:00Z",
            "fields": {"0": {"label": "Name", "type": "text"}},
        })));

        let schema = service.latest_schema("Legacy").await.unwrap();
        assert_eq!(schema.fields(), &[FieldDescriptor::new("Name", FieldType::Text)]);
    }

    #[tokio::test]
    async fn test_save_store_fault() {
        let (service, store, publisher) = service();
        store.inject_fault(StoreError::PermissionDenied("missing or insufficient permissions".into()));

        let err = service.save_schema(signup_command()).await.unwrap_err();
        assert!(err.is_store_fault());
        assert!(publisher.events().is_empty());

        // Not retried; the next call goes through
        service.save_schema(signup_command()).await.unwrap();
        assert_eq!(store.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_read_store_fault_distinct_from_not_found() {
        let (service, store, _) = service();
        store.inject_fault(StoreError::MissingIndex("formName ASC, createdAt DESC".into()));

        let err = service.latest_schema("Signup").await.unwrap_err();
        assert!(err.is_store_fault());
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_malformed_document_is_store_fault() {
        let (service, store, _) = service();
        store.seed("forms", object(json!({
            "formName": "Broken",
            "createdAt": "2024-01-01T00:00:00Z",
            "fields": "Name,Email",
        })));

        let err = service.latest_schema("Broken").await.unwrap_err();
        assert!(matches!(err, FormError::StoreFault(StoreError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_publishes_schema_event() {
        let (service, _, publisher) = service();
        let id = service.save_schema(signup_command()).await.unwrap();

        let events = publisher.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            DomainEvent::Schema(SchemaEvent::Published { revision_id, field_count, .. }) => {
                assert_eq!(revision_id, &id);
                assert_eq!(*field_count, 2);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publisher_failure_does_not_fail_save() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let publisher = Arc::new(RecordingEventPublisher::failing(StoreError::Unavailable("bus down".into())));
        let service = SchemaService::new(store.clone(), publisher);

        service.save_schema(signup_command()).await.unwrap();
        assert_eq!(store.documents("forms").len(), 1);
    }

    #[tokio::test]
    async fn test_custom_collection() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = SchemaService::new(store.clone(), Arc::new(RecordingEventPublisher::new()))
            .with_collection("forms_staging");

        service.save_schema(signup_command()).await.unwrap();
        assert_eq!(store.documents("forms_staging").len(), 1);
        assert!(store.documents("forms").is_empty());
    }

    fn candidate_strategy() -> impl Strategy<Value = FieldCandidate> {
        let label = "[A-Za-z][A-Za-z0-9 ]{0,12}";
        prop_oneof![
            (label, prop::sample::select(vec!["text", "number", "date", "email", "color"]))
                .prop_map(|(l, t)| FieldCandidate::new(l, t)),
            (label, prop::collection::vec("[A-Za-z0-9]{1,6}", 1..5)).prop_map(|(l, opts)| {
                FieldCandidate::new(l, "dropdown").with_options(OptionsInput::Csv(opts.join(" , ")))
            }),
        ]
    }

    proptest! {
        #[test]
        fn prop_saved_fields_read_back_identical(
            name in "[A-Za-z][A-Za-z0-9 ]{0,16}",
            candidates in prop::collection::vec(candidate_strategy(), 1..6),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (service, _, _) = service();
            let expected = FieldValidator::validate_all(&candidates).unwrap();

            let schema = runtime.block_on(async {
                service.save_schema(SaveSchemaCommand::new(name.clone(), candidates)).await.unwrap();
                service.latest_schema(&name).await.unwrap()
            });

            prop_assert_eq!(schema.fields(), expected.as_slice());
        }
    }
}
