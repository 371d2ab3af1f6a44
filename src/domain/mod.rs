// Domain layer - Core data types for fiber, event and well datasets
pub mod bounds;
pub mod catalog;
pub mod colorscale;
pub mod error;
pub mod render_config;
pub mod scene;
pub mod time_series;
pub mod trajectory;
