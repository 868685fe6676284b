// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_series_fetcher;
pub mod in_memory_selection;
