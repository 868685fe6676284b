// Widget state owned by the synchronization controller
use super::series::SeriesModel;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
    /// No identifier tracked yet
    #[default]
    Idle,
    /// Identifier tracked, series for it not yet applied
    Resolving,
    /// Series for the tracked identifier applied
    Ready,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetState {
    pub label: String,
    pub identifier: String,
    pub series: Option<SeriesModel>,
    pub phase: SyncPhase,
}

impl WidgetState {
    pub fn is_tracking(&self, identifier: &str) -> bool {
        !self.identifier.is_empty() && self.identifier == identifier
    }
}
