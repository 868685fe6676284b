// Port for the host's selection model
use crate::domain::selection::{ElementProps, ElementRef, SelectionEvent};
use async_trait::async_trait;
use std::sync::Arc;

/// Callback invoked by the host on every selection change
pub type SelectionListener = Arc<dyn Fn(SelectionEvent) + Send + Sync>;

/// Handle returned by `add_listener`; the only way to remove that listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[async_trait]
pub trait SelectionSource: Send + Sync {
    fn add_listener(&self, listener: SelectionListener) -> ListenerId;

    /// Returns false if no listener was registered under `id`
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Look up the properties of one selected element
    async fn get_props(&self, element: &ElementRef) -> anyhow::Result<Vec<ElementProps>>;
}

/// Scoped selection-changed subscription.
///
/// Keeps the exact `ListenerId` handed out at acquisition and removes that
/// listener exactly once, either through `release` or when dropped.
pub struct SelectionSubscription {
    source: Arc<dyn SelectionSource>,
    listener_id: Option<ListenerId>,
}

impl SelectionSubscription {
    pub fn acquire(source: Arc<dyn SelectionSource>, listener: SelectionListener) -> Self {
        let listener_id = source.add_listener(listener);
        tracing::debug!(listener = listener_id.0, "selection listener added");
        Self {
            source,
            listener_id: Some(listener_id),
        }
    }

    /// Idempotent; only the first call reaches the source
    pub fn release(&mut self) -> bool {
        match self.listener_id.take() {
            Some(id) => {
                let removed = self.source.remove_listener(id);
                if !removed {
                    tracing::warn!(listener = id.0, "selection listener was already gone");
                }
                removed
            }
            None => false,
        }
    }
}

impl Drop for SelectionSubscription {
    fn drop(&mut self) {
        self.release();
    }
}
