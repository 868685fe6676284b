// Domain layer - Pure types with no I/O
pub mod selection;
pub mod series;
pub mod telemetry;
pub mod widget;
