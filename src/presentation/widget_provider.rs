// Widget registration for the host's panel system
use serde::{Deserialize, Serialize};

pub const PROVIDER_ID: &str = "SensorWidgetUiProvider";
pub const WIDGET_ID: &str = "SensorWidget";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagePanelLocation {
    Top,
    Left,
    Right,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagePanelSection {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetDefaultState {
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDefinition {
    pub id: String,
    pub label: String,
    pub default_state: WidgetDefaultState,
}

pub trait UiItemsProvider: Send + Sync {
    fn id(&self) -> &str;

    fn provide_widgets(
        &self,
        stage_id: &str,
        stage_usage: &str,
        location: StagePanelLocation,
        section: Option<StagePanelSection>,
    ) -> Vec<WidgetDefinition>;
}

#[derive(Debug, Clone, Default)]
pub struct SensorWidgetProvider;

impl UiItemsProvider for SensorWidgetProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    /// The sensor widget lives in the right-hand panel only
    fn provide_widgets(
        &self,
        _stage_id: &str,
        _stage_usage: &str,
        location: StagePanelLocation,
        _section: Option<StagePanelSection>,
    ) -> Vec<WidgetDefinition> {
        if location != StagePanelLocation::Right {
            return Vec::new();
        }
        vec![WidgetDefinition {
            id: WIDGET_ID.to_string(),
            label: WIDGET_ID.to_string(),
            default_state: WidgetDefaultState::Open,
        }]
    }
}
