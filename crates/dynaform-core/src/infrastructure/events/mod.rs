//! Event publisher implementations

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::DomainEvent;
use crate::ports::outbound::{EventPublisher, StoreError};

/// Writes each event to the log
#[derive(Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), StoreError> {
        for event in &events {
            tracing::info!(event = event.event_type(), form = %event.form_name(), "Domain event");
        }
        Ok(())
    }
}

/// Keeps published events in memory (for testing)
#[derive(Default)]
pub struct RecordingEventPublisher {
    events: Mutex<Vec<DomainEvent>>,
    failure: Option<StoreError>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publisher rejecting every batch with `error`
    pub fn failing(error: StoreError) -> Self {
        Self { events: Mutex::new(vec![]), failure: Some(error) }
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), StoreError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.events.lock().extend(events);
        Ok(())
    }
}
