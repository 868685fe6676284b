// Presentation layer - Rendering, widget registration and the dev host surface
pub mod app_state;
pub mod chart_renderer;
pub mod handlers;
pub mod widget_provider;
