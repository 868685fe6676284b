// Main entry point - Dependency injection and dev host setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::series_fetcher::SeriesFetcher;
use crate::application::sync_controller::SyncController;
use crate::infrastructure::config::load_widget_config;
use crate::infrastructure::http_series_fetcher::HttpSeriesFetcher;
use crate::infrastructure::in_memory_selection::InMemorySelectionSource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::router;
use crate::presentation::widget_provider::{SensorWidgetProvider, UiItemsProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_widget_config()?;

    // Create fetcher (infrastructure layer); no endpoint means no fetching
    let fetcher = HttpSeriesFetcher::from_config(&config).map(|f| Arc::new(f) as Arc<dyn SeriesFetcher>);
    match config.sensor_endpoint() {
        Some(endpoint) => tracing::info!("Sensor endpoint: {}", endpoint),
        None => tracing::info!("IMJS_SENSOR_ENDPOINT not set, series fetching disabled"),
    }

    // Mount the widget against the in-memory host (application layer)
    let selection = Arc::new(InMemorySelectionSource::new());
    let controller = SyncController::mount(selection.clone(), fetcher);

    let provider = SensorWidgetProvider;
    tracing::info!("Registered widget provider {}", provider.id());

    let state = Arc::new(AppState {
        selection,
        widget: controller.subscribe(),
        provider,
    });

    // Start dev host (presentation layer)
    let addr: SocketAddr = config.listen_addr.parse()?;
    tracing::info!("Starting sensor widget dev host on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    controller.unmount().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
