// HTTP request handlers for the dev host
use crate::domain::selection::{ElementProps, ElementRef};
use crate::presentation::app_state::AppState;
use crate::presentation::chart_renderer::{render, WidgetView};
use crate::presentation::widget_provider::{StagePanelLocation, StagePanelSection, UiItemsProvider, WidgetDefinition};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRegistration {
    pub element: ElementRef,
    #[serde(flatten)]
    pub props: ElementProps,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    #[serde(default)]
    pub elements: Vec<ElementRef>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SelectionAccepted {
    pub listeners: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Health {
    pub status: &'static str,
    pub selection_listeners: usize,
}

#[derive(Debug, Deserialize)]
pub struct PanelQuery {
    pub location: StagePanelLocation,
    pub section: Option<StagePanelSection>,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub usage: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/elements", post(register_elements))
        .route("/selection", post(select_elements))
        .route("/widget", get(current_widget))
        .route("/widget/events", get(widget_events))
        .route("/widgets", get(list_widgets))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint; a mounted widget shows up as one selection listener
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        selection_listeners: state.selection.listener_count(),
    })
}

/// Register elements the fake host knows about
pub async fn register_elements(
    State(state): State<Arc<AppState>>,
    Json(elements): Json<Vec<ElementRegistration>>,
) -> StatusCode {
    for registration in elements {
        state.selection.register(registration.element, vec![registration.props]);
    }
    StatusCode::NO_CONTENT
}

/// Emit a selection-changed event, as the host would on a click
pub async fn select_elements(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectionRequest>,
) -> (StatusCode, Json<SelectionAccepted>) {
    let listeners = state.selection.select(request.elements);
    (StatusCode::ACCEPTED, Json(SelectionAccepted { listeners }))
}

/// Render the latest widget snapshot
pub async fn current_widget(State(state): State<Arc<AppState>>) -> Json<WidgetView> {
    let snapshot = state.widget.borrow().clone();
    Json(render(&snapshot))
}

/// Stream a rendered view on every widget state change
pub async fn widget_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = WatchStream::new(state.widget.clone())
        .map(|snapshot| Event::default().event("widget").json_data(render(&snapshot)));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Widgets the provider contributes to a panel location
pub async fn list_widgets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PanelQuery>,
) -> Json<Vec<WidgetDefinition>> {
    Json(state.provider.provide_widgets(
        &query.stage,
        &query.usage,
        query.location,
        query.section,
    ))
}
