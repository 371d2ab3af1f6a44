// Dataset service - Use case for loading every source into a scene snapshot
use crate::application::dataset_repository::{DatasetRepository, WellSurvey};
use crate::application::scene_composer::{FiberSource, SceneSources};
use crate::application::spatial_mapper::{ProjectedOrigin, reference_trajectory};
use crate::domain::trajectory::{Trajectory, TrajectoryPoint};
use std::sync::Arc;

#[derive(Clone)]
pub struct DatasetService {
    repository: Arc<dyn DatasetRepository>,
    origin: ProjectedOrigin,
    invert_depth: bool,
    fiber_well: Option<String>,
}

impl DatasetService {
    pub fn new(repository: Arc<dyn DatasetRepository>, origin: ProjectedOrigin) -> Self {
        Self {
            repository,
            origin,
            invert_depth: true,
            fiber_well: None,
        }
    }

    /// Store TVD as negative elevation instead of positive depth.
    pub fn with_invert_depth(mut self, invert: bool) -> Self {
        self.invert_depth = invert;
        self
    }

    /// Well the fiber is installed in; defaults to the first loaded well.
    pub fn with_fiber_well(mut self, well: Option<String>) -> Self {
        self.fiber_well = well;
        self
    }

    /// Loads each source once. A source that fails to load is logged and left
    /// out of the snapshot.
    pub async fn load_sources(&self) -> SceneSources {
        let catalog = match self.repository.load_catalog().await {
            Ok(catalog) => catalog.map(Arc::new),
            Err(e) => {
                tracing::error!("Failed to load microseismic catalog: {:#}", e);
                None
            }
        };

        let wells: Vec<Arc<Trajectory>> = match self.repository.load_wells().await {
            Ok(surveys) => surveys.iter().map(|s| Arc::new(self.place_well(s))).collect(),
            Err(e) => {
                tracing::error!("Failed to load well trajectories: {:#}", e);
                Vec::new()
            }
        };

        let fiber = match self.repository.load_fiber().await {
            Ok(series) => series.map(|series| FiberSource {
                series: Arc::new(series),
                well: self
                    .fiber_well
                    .clone()
                    .or_else(|| wells.first().map(|w| w.name().to_string())),
            }),
            Err(e) => {
                tracing::error!("Failed to load fiber recording: {:#}", e);
                None
            }
        };

        tracing::info!(
            "Loaded {} events, {} wells, fiber: {}",
            catalog.as_ref().map(|c| c.len()).unwrap_or(0),
            wells.len(),
            fiber.as_ref().map(|f| f.series.channel_count()).map_or("none".to_string(), |n| format!("{} channels", n))
        );

        SceneSources { catalog, wells, fiber }
    }

    fn place_well(&self, survey: &WellSurvey) -> Trajectory {
        let sign = if self.invert_depth { -1.0 } else { 1.0 };
        let offsets: Vec<TrajectoryPoint> = survey
            .offsets
            .iter()
            .map(|p| TrajectoryPoint::new(p.easting, p.northing, sign * p.tvdss))
            .collect();
        reference_trajectory(&survey.name, &offsets, self.origin)
    }
}
