// Route table for the viewer surface
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_animation, get_fiber_time_range, get_options, get_scene, get_static, get_waterfall, health_check, index, post_controls,
    stream_scene,
};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Responses are compressed by the handlers, so no CompressionLayer here
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(health_check))
        .route("/api/options", get(get_options))
        .route("/api/scene", get(get_scene))
        .route("/api/scene/stream", get(stream_scene))
        .route("/api/controls", post(post_controls))
        .route("/api/static", get(get_static))
        .route("/api/animation", get(get_animation))
        .route("/api/waterfall", get(get_waterfall))
        .route("/api/das/time-range", get(get_fiber_time_range))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
