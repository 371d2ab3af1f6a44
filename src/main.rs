// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::dataset_service::DatasetService;
use crate::application::session::ViewerSession;
use crate::application::spatial_mapper::ProjectedOrigin;
use crate::infrastructure::config::load_viewer_config;
use crate::infrastructure::file_repository::FileRepository;
use crate::infrastructure::projection::{LambertConformalConic, Projection};
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_viewer_config()?;

    // Project the survey reference point onto the well coordinate plane
    let projection = LambertConformalConic::new(config.reference.projection.clone());
    let (easting, northing) = projection.project(config.reference.lon, config.reference.lat);
    tracing::info!(
        "Reference point ({}, {}) -> easting {:.2} ft, northing {:.2} ft",
        config.reference.lat,
        config.reference.lon,
        easting,
        northing
    );

    // Create repository (infrastructure layer)
    let repository = Arc::new(FileRepository::new(
        config.data.catalog.clone(),
        config.data.wells.clone(),
        config.data.fiber.clone(),
    ));

    // Create services (application layer)
    let dataset_service = DatasetService::new(repository, ProjectedOrigin { easting, northing })
        .with_invert_depth(config.reference.invert_depth)
        .with_fiber_well(config.reference.fiber_well.clone());
    let sources = dataset_service.load_sources().await;

    let session = ViewerSession::new(sources, config.display.scene_config()?)
        .with_static_layout(config.display.static_layout()?);

    // Create application state
    let state = Arc::new(AppState::new(session));

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Starting viewer on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
