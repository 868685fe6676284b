// Synchronization controller - Keeps the widget state in step with the host selection
use crate::application::identifier_resolver::IdentifierResolver;
use crate::application::selection_source::{SelectionListener, SelectionSource, SelectionSubscription};
use crate::application::series_fetcher::{FetchError, SeriesFetcher};
use crate::domain::selection::{ResolvedSelection, SelectionEvent};
use crate::domain::series::{SeriesModel, DEFAULT_SERIES_NAME};
use crate::domain::widget::{SyncPhase, WidgetState};
use futures::future::{AbortHandle, Abortable};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

enum Command {
    SelectionChanged(SelectionEvent),
    SelectionResolved {
        sequence: u64,
        resolved: Option<ResolvedSelection>,
    },
    FetchCompleted {
        identifier: String,
        series: SeriesModel,
    },
    FetchFailed {
        identifier: String,
        error: FetchError,
    },
}

/// Mounted sensor widget.
///
/// All state changes happen on one actor task; readers only ever see
/// snapshots published through a watch channel. Dropping the controller
/// has the same effect as `unmount`, minus waiting for the actor to stop.
pub struct SyncController {
    subscription: Option<SelectionSubscription>,
    actor: Option<JoinHandle<()>>,
    state: watch::Receiver<WidgetState>,
}

impl SyncController {
    /// Subscribe to `source` and start the actor. Must be called inside a tokio runtime.
    ///
    /// With no fetcher, selections still update label and identifier but
    /// no series is ever loaded.
    pub fn mount(source: Arc<dyn SelectionSource>, fetcher: Option<Arc<dyn SeriesFetcher>>) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(WidgetState::default());

        let listener_tx = commands_tx.clone();
        let listener: SelectionListener = Arc::new(move |event: SelectionEvent| {
            // the actor may already be gone during unmount
            let _ = listener_tx.send(Command::SelectionChanged(event));
        });
        let subscription = SelectionSubscription::acquire(source.clone(), listener);

        let actor = SyncActor::new(IdentifierResolver::new(source), fetcher, commands_tx, state_tx);
        let handle = tokio::spawn(actor.run(commands_rx));

        tracing::info!("sensor widget mounted");

        Self {
            subscription: Some(subscription),
            actor: Some(handle),
            state: state_rx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WidgetState> {
        self.state.clone()
    }

    /// Release the selection subscription, cancel in-flight work and wait
    /// for the actor to stop. Nothing mutates the state after this returns.
    pub async fn unmount(mut self) {
        if let Some(handle) = self.shutdown() {
            // a cancelled JoinError is the expected outcome
            let _ = handle.await;
        }
        tracing::info!("sensor widget unmounted");
    }

    fn shutdown(&mut self) -> Option<JoinHandle<()>> {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.release();
        }
        let handle = self.actor.take()?;
        handle.abort();
        Some(handle)
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct SyncActor {
    resolver: IdentifierResolver,
    fetcher: Option<Arc<dyn SeriesFetcher>>,
    commands: mpsc::UnboundedSender<Command>,
    published: watch::Sender<WidgetState>,
    state: WidgetState,
    sequence: u64,
    resolving: Option<AbortHandle>,
    fetching: Option<AbortHandle>,
}

impl SyncActor {
    fn new(
        resolver: IdentifierResolver,
        fetcher: Option<Arc<dyn SeriesFetcher>>,
        commands: mpsc::UnboundedSender<Command>,
        published: watch::Sender<WidgetState>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            commands,
            published,
            state: WidgetState::default(),
            sequence: 0,
            resolving: None,
            fetching: None,
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            self.handle(command);
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SelectionChanged(event) => self.on_selection_changed(event),
            Command::SelectionResolved { sequence, resolved } => {
                self.on_selection_resolved(sequence, resolved)
            }
            Command::FetchCompleted { identifier, series } => {
                self.on_fetch_completed(identifier, series)
            }
            Command::FetchFailed { identifier, error } => self.on_fetch_failed(identifier, error),
        }
    }

    fn on_selection_changed(&mut self, event: SelectionEvent) {
        // every event supersedes whatever resolution is still running
        self.sequence += 1;
        if let Some(previous) = self.resolving.take() {
            previous.abort();
        }

        if event.is_empty() {
            tracing::debug!(sequence = self.sequence, "empty selection, keeping current element");
            return;
        }

        let (handle, registration) = AbortHandle::new_pair();
        let resolver = self.resolver.clone();
        let commands = self.commands.clone();
        let sequence = self.sequence;

        tokio::spawn(Abortable::new(
            async move {
                let resolved = resolver.resolve(&event).await;
                let _ = commands.send(Command::SelectionResolved { sequence, resolved });
            },
            registration,
        ));
        self.resolving = Some(handle);
    }

    fn on_selection_resolved(&mut self, sequence: u64, resolved: Option<ResolvedSelection>) {
        if sequence != self.sequence {
            tracing::debug!(sequence, current = self.sequence, "discarding superseded resolution");
            return;
        }
        self.resolving = None;

        let Some(selection) = resolved else {
            tracing::debug!(sequence, "no selected element resolved, keeping current element");
            return;
        };

        let identifier_changed = selection.identifier != self.state.identifier;
        let label_changed = selection.label != self.state.label;
        if !identifier_changed && !label_changed {
            return;
        }

        self.state.label = selection.label;
        if identifier_changed {
            tracing::info!(identifier = %selection.identifier, label = %self.state.label, "tracking sensor");
            self.state.identifier = selection.identifier;
            self.state.phase = SyncPhase::Resolving;
            self.start_fetch();
        }
        self.publish();
    }

    fn start_fetch(&mut self) {
        if let Some(previous) = self.fetching.take() {
            previous.abort();
        }

        if self.state.identifier.is_empty() {
            return;
        }
        let Some(fetcher) = self.fetcher.clone() else {
            tracing::debug!(identifier = %self.state.identifier, "no sensor endpoint configured, skipping fetch");
            return;
        };

        let (handle, registration) = AbortHandle::new_pair();
        let commands = self.commands.clone();
        let identifier = self.state.identifier.clone();

        tokio::spawn(Abortable::new(
            async move {
                let command = match fetcher.fetch(&identifier).await {
                    Ok(points) => Command::FetchCompleted {
                        series: SeriesModel::build(DEFAULT_SERIES_NAME, points),
                        identifier,
                    },
                    Err(error) => Command::FetchFailed { identifier, error },
                };
                let _ = commands.send(command);
            },
            registration,
        ));
        self.fetching = Some(handle);
    }

    fn on_fetch_completed(&mut self, identifier: String, series: SeriesModel) {
        if !self.state.is_tracking(&identifier) {
            tracing::debug!(
                %identifier,
                current = %self.state.identifier,
                "discarding stale series"
            );
            return;
        }
        self.fetching = None;

        if series.is_empty() {
            tracing::debug!(%identifier, "sensor returned no points");
        } else {
            tracing::debug!(%identifier, points = series.len(), "series loaded");
        }
        self.state.series = Some(series);
        self.state.phase = SyncPhase::Ready;
        self.publish();
    }

    fn on_fetch_failed(&mut self, identifier: String, error: FetchError) {
        tracing::warn!(%identifier, "failed to load sensor series: {}", error);
        if self.state.is_tracking(&identifier) {
            self.fetching = None;
        }
    }

    fn publish(&self) {
        self.published.send_replace(self.state.clone());
    }
}

impl Drop for SyncActor {
    fn drop(&mut self) {
        if let Some(handle) = self.resolving.take() {
            handle.abort();
        }
        if let Some(handle) = self.fetching.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::selection::{ElementProps, ElementRef};
    use crate::domain::telemetry::DataPoint;
    use crate::infrastructure::in_memory_selection::InMemorySelectionSource;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    type FetchResult = Result<Vec<DataPoint>, FetchError>;

    /// Each fetch waits until the test releases the result for that identifier
    #[derive(Default)]
    struct GatedFetcher {
        gates: Mutex<HashMap<String, oneshot::Receiver<FetchResult>>>,
        calls: Mutex<Vec<String>>,
    }

    impl GatedFetcher {
        fn gate(&self, identifier: &str) -> oneshot::Sender<FetchResult> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(identifier.to_string(), rx);
            tx
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SeriesFetcher for GatedFetcher {
        async fn fetch(&self, identifier: &str) -> FetchResult {
            self.calls.lock().unwrap().push(identifier.to_string());
            let gate = self.gates.lock().unwrap().remove(identifier);
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(FetchError::Malformed("gate dropped".to_string()))),
                None => Err(FetchError::Malformed(format!("no gate for {identifier}"))),
            }
        }
    }

    fn host() -> Arc<InMemorySelectionSource> {
        let source = Arc::new(InMemorySelectionSource::new());
        source.register(ElementRef::from("0x1"), vec![ElementProps::new("E1", "Pump A")]);
        source.register(ElementRef::from("0x2"), vec![ElementProps::new("E2", "Pump B")]);
        source.register(ElementRef::from("0x3"), vec![ElementProps::default()]);
        source
    }

    fn pump_a_points() -> Vec<DataPoint> {
        vec![DataPoint::new(1000, 5.0), DataPoint::new(2000, 7.0)]
    }

    async fn wait_for(
        rx: &mut watch::Receiver<WidgetState>,
        predicate: impl FnMut(&WidgetState) -> bool,
    ) -> WidgetState {
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for widget state")
            .expect("controller dropped")
            .clone()
    }

    fn snapshot(controller: &SyncController) -> WidgetState {
        controller.subscribe().borrow().clone()
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_selection_loads_series() {
        let source = host();
        let fetcher = Arc::new(GatedFetcher::default());
        let release_e1 = fetcher.gate("E1");
        let controller = SyncController::mount(source.clone(), Some(fetcher.clone()));
        let mut rx = controller.subscribe();

        source.select(vec![ElementRef::from("0x1")]);
        let state = wait_for(&mut rx, |s| s.identifier == "E1").await;
        assert_eq!(state.label, "Pump A");
        assert_eq!(state.phase, SyncPhase::Resolving);
        assert!(state.series.is_none());

        release_e1.send(Ok(pump_a_points())).unwrap();
        let state = wait_for(&mut rx, |s| s.phase == SyncPhase::Ready).await;
        let series = state.series.expect("series applied");
        assert_eq!(series.len(), 2);
        assert_eq!(series.min(), Some(5.0));
        assert_eq!(series.max(), Some(7.0));
        assert_eq!(fetcher.calls(), vec!["E1".to_string()]);

        controller.unmount().await;
    }

    #[tokio::test]
    async fn test_newer_selection_wins_over_slow_fetch() {
        let source = host();
        let fetcher = Arc::new(GatedFetcher::default());
        let release_e1 = fetcher.gate("E1");
        let release_e2 = fetcher.gate("E2");
        let controller = SyncController::mount(source.clone(), Some(fetcher.clone()));
        let mut rx = controller.subscribe();

        source.select(vec![ElementRef::from("0x1")]);
        wait_for(&mut rx, |s| s.identifier == "E1").await;
        source.select(vec![ElementRef::from("0x2")]);
        wait_for(&mut rx, |s| s.identifier == "E2").await;

        // E1 was superseded; whatever it delivers now must not land
        let _ = release_e1.send(Ok(pump_a_points()));
        settle().await;
        let state = snapshot(&controller);
        assert_eq!(state.identifier, "E2");
        assert_eq!(state.label, "Pump B");
        assert!(state.series.is_none());

        release_e2.send(Ok(vec![DataPoint::new(3000, 1.0)])).unwrap();
        let state = wait_for(&mut rx, |s| s.phase == SyncPhase::Ready).await;
        assert_eq!(state.series.unwrap().max(), Some(1.0));

        controller.unmount().await;
    }

    #[tokio::test]
    async fn test_unresolvable_selection_keeps_current_element() {
        let source = host();
        let fetcher = Arc::new(GatedFetcher::default());
        let _release_e1 = fetcher.gate("E1");
        let controller = SyncController::mount(source.clone(), Some(fetcher.clone()));
        let mut rx = controller.subscribe();

        source.select(vec![ElementRef::from("0x1")]);
        wait_for(&mut rx, |s| s.identifier == "E1").await;

        source.select(vec![ElementRef::from("0x3"), ElementRef::from("missing")]);
        source.select(Vec::new());
        settle().await;

        let state = snapshot(&controller);
        assert_eq!(state.identifier, "E1");
        assert_eq!(state.label, "Pump A");
        assert_eq!(fetcher.calls(), vec!["E1".to_string()]);

        controller.unmount().await;
    }

    #[tokio::test]
    async fn test_reselecting_same_identifier_does_not_refetch() {
        let source = host();
        source.register(ElementRef::from("0x9"), vec![ElementProps::new("E1", "Pump A (renamed)")]);
        let fetcher = Arc::new(GatedFetcher::default());
        let release_e1 = fetcher.gate("E1");
        let controller = SyncController::mount(source.clone(), Some(fetcher.clone()));
        let mut rx = controller.subscribe();

        source.select(vec![ElementRef::from("0x1")]);
        wait_for(&mut rx, |s| s.identifier == "E1").await;
        release_e1.send(Ok(pump_a_points())).unwrap();
        wait_for(&mut rx, |s| s.phase == SyncPhase::Ready).await;

        source.select(vec![ElementRef::from("0x9")]);
        let state = wait_for(&mut rx, |s| s.label == "Pump A (renamed)").await;
        assert_eq!(state.phase, SyncPhase::Ready);
        assert!(state.series.is_some());
        assert_eq!(fetcher.calls().len(), 1);

        controller.unmount().await;
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_state_alone() {
        let source = host();
        let fetcher = Arc::new(GatedFetcher::default());
        let release_e1 = fetcher.gate("E1");
        let release_e2 = fetcher.gate("E2");
        let controller = SyncController::mount(source.clone(), Some(fetcher.clone()));
        let mut rx = controller.subscribe();

        source.select(vec![ElementRef::from("0x1")]);
        wait_for(&mut rx, |s| s.identifier == "E1").await;
        release_e1.send(Ok(pump_a_points())).unwrap();
        let loaded = wait_for(&mut rx, |s| s.phase == SyncPhase::Ready).await;

        source.select(vec![ElementRef::from("0x2")]);
        wait_for(&mut rx, |s| s.identifier == "E2").await;
        release_e2
            .send(Err(FetchError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            }))
            .unwrap();
        settle().await;

        // the previous series stays on display, nothing is surfaced
        let state = snapshot(&controller);
        assert_eq!(state.identifier, "E2");
        assert_eq!(state.phase, SyncPhase::Resolving);
        assert_eq!(state.series, loaded.series);

        controller.unmount().await;
    }

    #[tokio::test]
    async fn test_missing_endpoint_never_loads_series() {
        let source = host();
        let controller = SyncController::mount(source.clone(), None);
        let mut rx = controller.subscribe();

        source.select(vec![ElementRef::from("0x1")]);
        let state = wait_for(&mut rx, |s| s.identifier == "E1").await;
        assert_eq!(state.label, "Pump A");

        source.select(vec![ElementRef::from("0x2")]);
        wait_for(&mut rx, |s| s.identifier == "E2").await;
        settle().await;
        assert!(snapshot(&controller).series.is_none());

        controller.unmount().await;
    }

    #[tokio::test]
    async fn test_unmount_with_fetch_in_flight() {
        let source = host();
        let fetcher = Arc::new(GatedFetcher::default());
        let release_e1 = fetcher.gate("E1");
        let controller = SyncController::mount(source.clone(), Some(fetcher.clone()));
        let mut rx = controller.subscribe();
        assert_eq!(source.listener_count(), 1);

        source.select(vec![ElementRef::from("0x1")]);
        wait_for(&mut rx, |s| s.identifier == "E1").await;
        settle().await;
        assert_eq!(fetcher.calls(), vec!["E1".to_string()]);

        controller.unmount().await;
        assert_eq!(source.listener_count(), 0);

        // the in-flight fetch was cancelled along with the actor
        settle().await;
        assert!(release_e1.send(Ok(pump_a_points())).is_err());
        assert_eq!(source.select(vec![ElementRef::from("0x2")]), 0);

        settle().await;
        let state = rx.borrow().clone();
        assert_eq!(state.identifier, "E1");
        assert!(state.series.is_none());
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let source = host();
        {
            let controller = SyncController::mount(source.clone(), None);
            assert_eq!(source.listener_count(), 1);
        }
        assert_eq!(source.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_completion_is_a_no_op() {
        let (commands_tx, _commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(WidgetState::default());
        let mut actor = SyncActor::new(IdentifierResolver::new(host()), None, commands_tx, state_tx);

        actor.handle(Command::SelectionChanged(SelectionEvent::new(vec![ElementRef::from("0x2")])));
        let sequence = actor.sequence;
        actor.handle(Command::SelectionResolved {
            sequence,
            resolved: Some(ResolvedSelection {
                identifier: "E2".to_string(),
                label: "Pump B".to_string(),
            }),
        });
        let before = state_rx.borrow().clone();
        assert_eq!(before.identifier, "E2");

        actor.handle(Command::FetchCompleted {
            identifier: "E1".to_string(),
            series: SeriesModel::build(DEFAULT_SERIES_NAME, pump_a_points()),
        });
        assert_eq!(*state_rx.borrow(), before);
        assert_eq!(actor.state, before);
    }

    #[tokio::test]
    async fn test_superseded_resolution_is_discarded() {
        let (commands_tx, _commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(WidgetState::default());
        let mut actor = SyncActor::new(IdentifierResolver::new(host()), None, commands_tx, state_tx);

        actor.handle(Command::SelectionChanged(SelectionEvent::new(vec![ElementRef::from("0x1")])));
        let first = actor.sequence;
        actor.handle(Command::SelectionChanged(SelectionEvent::new(vec![ElementRef::from("0x2")])));

        actor.handle(Command::SelectionResolved {
            sequence: first,
            resolved: Some(ResolvedSelection {
                identifier: "E1".to_string(),
                label: "Pump A".to_string(),
            }),
        });
        assert_eq!(*state_rx.borrow(), WidgetState::default());
    }
}
