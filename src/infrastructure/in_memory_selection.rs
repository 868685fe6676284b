// In-memory selection source - Host stand-in for the dev server and tests
use crate::application::selection_source::{ListenerId, SelectionListener, SelectionSource};
use crate::domain::selection::{ElementProps, ElementRef, SelectionEvent};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

#[derive(Default)]
pub struct InMemorySelectionSource {
    elements: RwLock<HashMap<ElementRef, Vec<ElementProps>>>,
    listeners: Mutex<HashMap<ListenerId, SelectionListener>>,
    next_listener: AtomicU64,
}

impl InMemorySelectionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the properties the host reports for `element`
    pub fn register(&self, element: ElementRef, props: Vec<ElementProps>) {
        self.elements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(element, props);
    }

    /// Emit a selection-changed event; returns how many listeners were notified
    pub fn select(&self, elements: Vec<ElementRef>) -> usize {
        // snapshot so listeners may (un)subscribe while being notified
        let listeners: Vec<SelectionListener> = self.listeners().values().cloned().collect();
        let event = SelectionEvent::new(elements);
        for listener in &listeners {
            listener(event.clone());
        }
        listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners().len()
    }

    fn listeners(&self) -> MutexGuard<'_, HashMap<ListenerId, SelectionListener>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SelectionSource for InMemorySelectionSource {
    fn add_listener(&self, listener: SelectionListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners().insert(id, listener);
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners().remove(&id).is_some()
    }

    async fn get_props(&self, element: &ElementRef) -> anyhow::Result<Vec<ElementProps>> {
        let elements = self.elements.read().unwrap_or_else(PoisonError::into_inner);
        match elements.get(element) {
            Some(props) => Ok(props.clone()),
            None => anyhow::bail!("unknown element {}", element.as_str()),
        }
    }
}
