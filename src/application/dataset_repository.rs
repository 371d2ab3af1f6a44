// Repository trait for dataset access
use crate::domain::catalog::EventCatalog;
use crate::domain::time_series::TimeSeries;
use crate::domain::trajectory::TrajectoryPoint;
use async_trait::async_trait;

/// Survey points of one well, relative to the shared reference point.
///
/// Depth is true vertical depth as recorded (positive down).
#[derive(Debug, Clone, PartialEq)]
pub struct WellSurvey {
    pub name: String,
    pub offsets: Vec<TrajectoryPoint>,
}

#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Microseismic event catalog, `None` when no catalog is configured
    async fn load_catalog(&self) -> anyhow::Result<Option<EventCatalog>>;

    /// Well surveys in first-appearance order
    async fn load_wells(&self) -> anyhow::Result<Vec<WellSurvey>>;

    /// Fiber signal matrix, `None` when no recording is configured
    async fn load_fiber(&self) -> anyhow::Result<Option<TimeSeries>>;
}
