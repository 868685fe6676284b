// Identifier resolver - Turns a selection event into an identifier and label
use crate::application::selection_source::SelectionSource;
use crate::domain::selection::{ElementProps, ElementRef, ResolvedSelection, SelectionEvent};
use futures::future::join_all;
use std::sync::Arc;

#[derive(Clone)]
pub struct IdentifierResolver {
    source: Arc<dyn SelectionSource>,
}

impl IdentifierResolver {
    pub fn new(source: Arc<dyn SelectionSource>) -> Self {
        Self { source }
    }

    /// Looks up every selected element concurrently. Results are taken in
    /// selection order and the last element that resolves wins, independent
    /// of which lookup finished last: "last-resolving" means last in selection
    /// order, not last to complete. Elements without id or label are skipped.
    pub async fn resolve(&self, event: &SelectionEvent) -> Option<ResolvedSelection> {
        let lookups = event.elements.iter().map(|element| self.lookup(element));
        join_all(lookups).await.into_iter().flatten().last()
    }

    async fn lookup(&self, element: &ElementRef) -> Option<ResolvedSelection> {
        match self.source.get_props(element).await {
            Ok(props) => {
                let resolved = props.first().and_then(ElementProps::resolve);
                if resolved.is_none() {
                    tracing::debug!(element = element.as_str(), "element has no id or label, skipping");
                }
                resolved
            }
            Err(e) => {
                tracing::warn!(element = element.as_str(), "property lookup failed: {:#}", e);
                None
            }
        }
    }
}
