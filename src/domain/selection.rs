// Selection domain model - what the host tells us the user picked
use serde::{Deserialize, Serialize};

/// Opaque reference to an element in the host's object model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementRef {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Host notification that the active selection changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEvent {
    pub elements: Vec<ElementRef>,
}

impl SelectionEvent {
    pub fn new(elements: Vec<ElementRef>) -> Self {
        Self { elements }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Element properties as returned by the host's data-access lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementProps {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_label: Option<String>,
}

impl ElementProps {
    #[cfg(test)]
    pub fn new(id: impl Into<String>, user_label: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            user_label: Some(user_label.into()),
        }
    }

    /// Both id and user label must be present and non-empty
    pub fn resolve(&self) -> Option<ResolvedSelection> {
        let id = self.id.as_deref().filter(|s| !s.is_empty())?;
        let label = self.user_label.as_deref().filter(|s| !s.is_empty())?;
        Some(ResolvedSelection {
            identifier: id.to_string(),
            label: label.to_string(),
        })
    }
}

/// Stable identifier plus display label for the selected element.
/// `identifier` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub identifier: String,
    pub label: String,
}
