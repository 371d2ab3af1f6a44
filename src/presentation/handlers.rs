// HTTP request handlers
use crate::application::session::ControlBatch;
use crate::domain::time_series::TargetTime;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::png_export::{profile_data_uri, waterfall_data_uri};
use crate::infrastructure::scene_stream::scene_event_stream;
use crate::presentation::app_state::AppState;
use crate::presentation::page::INDEX_HTML;
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_WATERFALL_SCALE: u32 = 2;
const PROFILE_SIZE: (u32, u32) = (800, 600);

#[derive(Deserialize)]
pub struct WaterfallQuery {
    /// Datetime text or a second offset, marked on the waterfall
    pub selected_time: Option<String>,
    /// Sample to plot as a depth profile instead of the waterfall
    pub time_index: Option<usize>,
    pub scale: Option<u32>,
}

#[derive(Serialize)]
struct WaterfallImage {
    image: String,
    width: usize,
    height: usize,
    marker_column: Option<usize>,
}

#[derive(Serialize)]
struct ProfileImage {
    image: String,
    title: String,
    time_s: f64,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

async fn json_or_status<T: Serialize + ?Sized>(data: &T, headers: &HeaderMap) -> Response {
    match json_response(data, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Widget choices for the control page
pub async fn get_options(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let options = state.session.lock().await.options();
    json_or_status(&options, &headers).await
}

pub async fn get_scene(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let scene = state.session.lock().await.scene();
    json_or_status(&*scene, &headers).await
}

/// Applies a batch of control changes and answers with the rebuilt scene
pub async fn post_controls(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(batch): Json<ControlBatch>,
) -> Response {
    let changes = batch.changes.len();
    match state.apply_controls(batch).await {
        Ok(scene) => {
            tracing::info!("Applied {} control change(s)", changes);
            json_or_status(&*scene, &headers).await
        }
        Err(e) => {
            tracing::warn!("Rejected control batch: {}", e);
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

/// Scene updates as server-sent events
pub async fn stream_scene(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    scene_event_stream(state.scene_tx.subscribe())
}

/// Static viewer scene with every source and the static layout
pub async fn get_static(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let scene = state.session.lock().await.static_scene();
    json_or_status(&scene, &headers).await
}

/// Downsampled waterfall as a PNG data URI, optionally marking a time.
/// With `time_index` the response is the depth profile at that sample.
pub async fn get_waterfall(
    headers: HeaderMap,
    Query(query): Query<WaterfallQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    if let Some(index) = query.time_index {
        return get_profile(headers, index, state).await;
    }

    let selected = match query.selected_time.as_deref().map(str::parse::<TargetTime>) {
        Some(Ok(target)) => Some(target),
        Some(Err(e)) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        None => None,
    };
    let grid = state.session.lock().await.waterfall(selected.as_ref());
    let Some(grid) = grid else {
        return error_response(StatusCode::NOT_FOUND, "no fiber recording loaded");
    };

    let scale = query.scale.unwrap_or(DEFAULT_WATERFALL_SCALE).clamp(1, 8);
    let encoded = tokio::task::spawn_blocking(move || waterfall_data_uri(&grid, scale).map(|uri| (uri, grid))).await;
    match encoded {
        Ok(Ok((image, grid))) => {
            let body = WaterfallImage {
                image,
                width: grid.width,
                height: grid.height,
                marker_column: grid.marker_column,
            };
            json_or_status(&body, &headers).await
        }
        Ok(Err(e)) => {
            tracing::error!("Waterfall export failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(e) => {
            tracing::error!("Waterfall task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "waterfall rendering failed")
        }
    }
}

async fn get_profile(headers: HeaderMap, index: usize, state: Arc<AppState>) -> Response {
    let Some(profile) = state.session.lock().await.profile(index) else {
        return error_response(StatusCode::NOT_FOUND, "no fiber recording loaded");
    };

    let (width, height) = PROFILE_SIZE;
    let encoded = tokio::task::spawn_blocking(move || profile_data_uri(&profile, width, height).map(|uri| (uri, profile))).await;
    match encoded {
        Ok(Ok((image, profile))) => {
            let body = ProfileImage {
                image,
                title: profile.title(),
                time_s: profile.time_s,
            };
            json_or_status(&body, &headers).await
        }
        Ok(Err(e)) => {
            tracing::warn!("Profile export failed: {}", e);
            error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        Err(e) => {
            tracing::error!("Profile task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "profile rendering failed")
        }
    }
}

/// Cumulative event animation over the current time window
pub async fn get_animation(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let animation = state.session.lock().await.animation();
    match animation {
        None => error_response(StatusCode::NOT_FOUND, "no event catalog loaded"),
        Some(Err(e)) => error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        Some(Ok(scene)) => json_or_status(&scene, &headers).await,
    }
}

/// Start, end and duration of the fiber recording
pub async fn get_fiber_time_range(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let range = state.session.lock().await.fiber_time_range();
    match range {
        None => error_response(StatusCode::NOT_FOUND, "no fiber recording loaded"),
        Some(Err(e)) => error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        Some(Ok(range)) => json_or_status(&range, &headers).await,
    }
}
