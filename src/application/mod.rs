// Application layer - Use cases and the ports they depend on
pub mod identifier_resolver;
pub mod selection_source;
pub mod series_fetcher;
pub mod sync_controller;
