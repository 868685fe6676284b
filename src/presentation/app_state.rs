// Application state for HTTP handlers
use crate::domain::widget::WidgetState;
use crate::infrastructure::in_memory_selection::InMemorySelectionSource;
use crate::presentation::widget_provider::SensorWidgetProvider;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub selection: Arc<InMemorySelectionSource>,
    pub widget: watch::Receiver<WidgetState>,
    pub provider: SensorWidgetProvider,
}
