//! Schema Watcher
//!
//! Polls the reader for the latest revision of one form and publishes the
//! observed state on a `tokio::sync::watch` channel.

use std::mem::discriminant;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::domain::aggregates::FormSchemaRevision;
use crate::domain::value_objects::RevisionId;
use crate::error::Operation;
use crate::ports::inbound::SchemaUseCases;

/// Default delay between two polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Shortest accepted delay; `tokio::time::interval` rejects zero
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Observed state of a watched form
#[derive(Clone, Debug, PartialEq)]
pub enum WatchState {
    /// No poll has completed yet
    Loading,
    Ready(FormSchemaRevision),
    NotFound,
    /// First load failed; carries a user-facing message only
    Failed(String),
}

impl WatchState {
    pub fn schema(&self) -> Option<&FormSchemaRevision> {
        match self {
            Self::Ready(schema) => Some(schema),
            _ => None,
        }
    }

    /// Same revision id, or same state kind
    fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Ready(a), Self::Ready(b)) => a.id() == b.id(),
            (Self::Failed(a), Self::Failed(b)) => a == b,
            _ => discriminant(self) == discriminant(other),
        }
    }
}

/// Spawns polling tasks over a schema reader
pub struct SchemaWatcher {
    use_cases: Arc<dyn SchemaUseCases>,
    interval: Duration,
}

impl SchemaWatcher {
    pub fn new(use_cases: Arc<dyn SchemaUseCases>) -> Self {
        Self { use_cases, interval: DEFAULT_POLL_INTERVAL }
    }

    /// Intervals below `MIN_POLL_INTERVAL` are raised to it
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Start polling `form_name`. The first poll runs immediately.
    pub fn spawn(&self, form_name: impl Into<String>) -> WatchHandle {
        let form_name = form_name.into();
        let (state_tx, state_rx) = watch::channel(WatchState::Loading);
        let (stop_tx, stop_rx) = oneshot::channel();

        tracing::debug!(form = %form_name, interval_ms = self.interval.as_millis() as u64, "Starting schema watcher");
        let task = tokio::spawn(poll_loop(
            self.use_cases.clone(),
            form_name,
            self.interval,
            state_tx,
            stop_rx,
        ));

        WatchHandle {
            state: state_rx,
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running watcher. Dropping it stops polling.
pub struct WatchHandle {
    state: watch::Receiver<WatchState>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    pub fn subscribe(&self) -> watch::Receiver<WatchState> {
        self.state.clone()
    }

    pub fn current(&self) -> WatchState {
        self.state.borrow().clone()
    }

    /// Stop polling and wait for an in-flight fetch to settle
    pub async fn stop(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Schema watcher task ended abnormally");
            }
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }
}

async fn poll_loop(
    use_cases: Arc<dyn SchemaUseCases>,
    form_name: String,
    period: Duration,
    state_tx: watch::Sender<WatchState>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut observed: Option<RevisionId> = None;

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            _ = state_tx.closed() => break,
            _ = ticker.tick() => {}
        }

        let result = use_cases.latest_schema(&form_name).await;

        // Stopped while the fetch was in flight
        if !matches!(stop_rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)) {
            tracing::debug!(form = %form_name, "Discarding fetch result of stopped watcher");
            break;
        }

        let next = match result {
            Ok(schema) => {
                if observed.as_ref() != Some(schema.id()) {
                    tracing::info!(form = %form_name, id = %schema.id(), "Observed schema revision");
                    observed = Some(schema.id().clone());
                }
                WatchState::Ready(schema)
            }
            Err(e) if observed.is_some() => {
                tracing::warn!(form = %form_name, error = %e, "Schema poll failed, keeping previous schema");
                continue;
            }
            Err(e) if e.is_not_found() => WatchState::NotFound,
            Err(e) => WatchState::Failed(e.user_message(Operation::Load)),
        };

        state_tx.send_if_modified(|current| {
            if current.is_same(&next) {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    tracing::debug!(form = %form_name, "Schema watcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::SchemaService;
    use crate::application::dto::{FieldCandidate, SaveSchemaCommand};
    use crate::infrastructure::events::RecordingEventPublisher;
    use crate::infrastructure::persistence::InMemoryDocumentStore;
    use crate::ports::outbound::StoreError;
    use tokio::time::{sleep, timeout};

    const TICK: Duration = Duration::from_millis(20);

    fn setup() -> (Arc<SchemaService>, Arc<InMemoryDocumentStore>, SchemaWatcher) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = Arc::new(SchemaService::new(store.clone(), Arc::new(RecordingEventPublisher::new())));
        let watcher = SchemaWatcher::new(service.clone()).with_interval(TICK);
        (service, store, watcher)
    }

    fn command(label: &str) -> SaveSchemaCommand {
        SaveSchemaCommand::new("Signup", vec![FieldCandidate::new(label, "text")])
    }

    async fn wait_until(rx: &mut watch::Receiver<WatchState>, pred: impl FnMut(&WatchState) -> bool) -> WatchState {
        timeout(Duration::from_secs(2), rx.wait_for(pred))
            .await
            .expect("watcher did not reach expected state")
            .expect("watcher channel closed")
            .clone()
    }

    #[tokio::test]
    async fn test_not_found_then_new_revision() {
        let (service, _, watcher) = setup();
        let handle = watcher.spawn("Signup");
        let mut rx = handle.subscribe();

        wait_until(&mut rx, |s| *s == WatchState::NotFound).await;

        let id = service.save_schema(command("Name")).await.unwrap();
        let state = wait_until(&mut rx, |s| s.schema().is_some()).await;
        assert_eq!(state.schema().unwrap().id(), &id);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_picks_up_newer_revision() {
        let (service, _, watcher) = setup();
        service.save_schema(command("First")).await.unwrap();

        let handle = watcher.spawn("Signup");
        let mut rx = handle.subscribe();
        wait_until(&mut rx, |s| s.schema().is_some()).await;

        let second = service.save_schema(command("Second")).await.unwrap();
        let state = wait_until(&mut rx, |s| s.schema().map(|r| r.id() == &second).unwrap_or(false)).await;
        assert_eq!(state.schema().unwrap().fields()[0].label, "Second");
    }

    #[tokio::test]
    async fn test_fault_keeps_previous_schema() {
        let (service, store, watcher) = setup();
        let id = service.save_schema(command("Name")).await.unwrap();

        let handle = watcher.spawn("Signup");
        let mut rx = handle.subscribe();
        wait_until(&mut rx, |s| s.schema().is_some()).await;

        let calls = store.query_calls();
        store.inject_fault(StoreError::Transport("connection reset".into()));
        sleep(TICK * 5).await;

        assert!(store.query_calls() > calls + 1);
        assert_eq!(handle.current().schema().map(|s| s.id().clone()), Some(id));
    }

    #[tokio::test]
    async fn test_initial_fault_reports_generic_message() {
        let (_, store, watcher) = setup();
        store.inject_fault(StoreError::PermissionDenied("rules rejected read".into()));

        let handle = watcher.spawn("Signup");
        let mut rx = handle.subscribe();
        let state = wait_until(&mut rx, |s| matches!(s, WatchState::Failed(_))).await;
        assert_eq!(state, WatchState::Failed("Failed to load form.".into()));

        // Recovers on a later poll
        wait_until(&mut rx, |s| *s == WatchState::NotFound).await;
    }

    #[tokio::test]
    async fn test_stop_ends_polling() {
        let (service, store, watcher) = setup();
        service.save_schema(command("Name")).await.unwrap();

        let handle = watcher.spawn("Signup");
        let mut rx = handle.subscribe();
        wait_until(&mut rx, |s| s.schema().is_some()).await;
        handle.stop().await;

        let calls = store.query_calls();
        sleep(TICK * 5).await;
        assert_eq!(store.query_calls(), calls);
    }

    #[tokio::test]
    async fn test_drop_ends_polling() {
        let (_, store, watcher) = setup();
        let handle = watcher.spawn("Signup");
        let mut rx = handle.subscribe();
        wait_until(&mut rx, |s| *s == WatchState::NotFound).await;
        drop(handle);

        // Let the task observe the stop signal
        sleep(TICK * 3).await;
        let calls = store.query_calls();
        sleep(TICK * 5).await;
        assert_eq!(store.query_calls(), calls);
    }

    #[tokio::test]
    async fn test_zero_interval_is_clamped() {
        let (service, _, _) = setup();
        let watcher = SchemaWatcher::new(service.clone()).with_interval(Duration::ZERO);
        assert_eq!(watcher.interval, MIN_POLL_INTERVAL);

        let handle = watcher.spawn("Signup");
        let mut rx = handle.subscribe();
        wait_until(&mut rx, |s| *s == WatchState::NotFound).await;

        let id = service.save_schema(command("Name")).await.unwrap();
        let state = wait_until(&mut rx, |s| s.schema().is_some()).await;
        assert_eq!(state.schema().unwrap().id(), &id);

        handle.stop().await;
    }

    #[test]
    fn test_same_state_comparison() {
        assert!(WatchState::Loading.is_same(&WatchState::Loading));
        assert!(WatchState::NotFound.is_same(&WatchState::NotFound));
        assert!(!WatchState::NotFound.is_same(&WatchState::Loading));
        assert!(!WatchState::Failed("a".into()).is_same(&WatchState::Failed("b".into())));
    }
}
