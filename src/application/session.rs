// Viewer session - applies control batches and rebuilds the scene once per batch
use crate::application::animation::compose_event_animation;
use crate::application::scene_composer::{SceneSources, compose};
use crate::application::trace_builder::fiber_color_range;
use crate::application::waterfall::{DepthProfile, WaterfallGrid, prepare_profile, prepare_waterfall};
use crate::application::time_alignment::{TimeRange, time_range};
use crate::domain::colorscale::Colorscale;
use crate::domain::error::{AlignmentError, ConfigError, TraceError};
use crate::domain::render_config::{
    AspectMode, AspectRatio, Axis, ColorRange, DasTimeSelection, LayoutConfig, SceneConfig,
};
use crate::domain::scene::{Camera, Scene};
use crate::domain::time_series::TargetTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One widget change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "control", content = "value", rename_all = "snake_case")]
pub enum Control {
    ColorBy(String),
    SizeBy(String),
    SizeRange(Option<(f64, f64)>),
    EventsColorscale(String),
    EventsColorbarRange(Option<ColorRange>),
    /// Slider positions into the sorted unique event times.
    EventsTimeRange([usize; 2]),
    FiberColorscale(String),
    FiberColorbarRange(Option<ColorRange>),
    FiberTime(DasTimeSelection),
    FiberDownsample([usize; 2]),
    AxisRange {
        axis: Axis,
        min: Option<f64>,
        max: Option<f64>,
    },
    AspectMode(String),
    AspectRatio(AspectRatio),
    Title(String),
    ResetCamera,
}

/// Changes delivered together by the page, plus the camera it last observed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ControlBatch {
    #[serde(default)]
    pub changes: Vec<Control>,
    #[serde(default)]
    pub camera: Option<Camera>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Rebuilding,
}

/// Values the page needs to build its widgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerOptions {
    pub attributes: Vec<String>,
    pub colorscales: Vec<String>,
    pub aspect_modes: Vec<&'static str>,
    pub event_times: Vec<String>,
    pub fiber_samples: usize,
    pub has_events: bool,
    pub has_fiber: bool,
    pub color_by: String,
    pub size_by: String,
}

pub struct ViewerSession {
    sources: SceneSources,
    config: SceneConfig,
    static_layout: LayoutConfig,
    camera: Option<Camera>,
    scene: Arc<Scene>,
    state: SessionState,
    rebuilds: u64,
}

impl ViewerSession {
    pub fn new(sources: SceneSources, config: SceneConfig) -> Self {
        let scene = Arc::new(compose(&sources, &config, None));
        Self {
            sources,
            config,
            static_layout: LayoutConfig::static_view(),
            camera: None,
            scene,
            state: SessionState::Idle,
            rebuilds: 1,
        }
    }

    pub fn with_static_layout(mut self, layout: LayoutConfig) -> Self {
        self.static_layout = layout;
        self
    }

    pub fn scene(&self) -> Arc<Scene> {
        self.scene.clone()
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Applies every change, then rebuilds once.
    ///
    /// A rejected change leaves the session untouched; the scene on display is
    /// only replaced after the new one is complete.
    pub fn apply(&mut self, batch: ControlBatch) -> Result<Arc<Scene>, ConfigError> {
        let mut next = self.config.clone();
        let mut camera = self.camera.clone();
        for change in batch.changes {
            self.apply_change(&mut next, &mut camera, change)?;
        }
        if let Some(observed) = batch.camera {
            camera = Some(observed);
        }

        self.config = next;
        self.camera = camera;
        self.rebuild();
        Ok(self.scene())
    }

    fn apply_change(
        &self,
        config: &mut SceneConfig,
        camera: &mut Option<Camera>,
        change: Control,
    ) -> Result<(), ConfigError> {
        match change {
            Control::ColorBy(attribute) => config.ms.set_colorby(attribute),
            Control::SizeBy(attribute) => config.ms.set_sizeby(attribute),
            Control::SizeRange(range) => config.ms.set_size_range(range),
            Control::EventsColorscale(name) => config.ms.set_colorscale(&name)?,
            Control::EventsColorbarRange(range) => config.ms.set_colorbar_range(range),
            Control::EventsTimeRange([a, b]) => match &self.sources.catalog {
                Some(catalog) if !catalog.origin_times().is_empty() => {
                    let times = catalog.origin_times();
                    let last = times.len() - 1;
                    config.ms.set_start_time(Some(times[a.min(b).min(last)]));
                    config.ms.set_end_time(Some(times[a.max(b).min(last)]));
                }
                _ => tracing::warn!("Ignoring event time range without loaded events"),
            },
            Control::FiberColorscale(name) => config.das.set_colorscale(&name)?,
            Control::FiberColorbarRange(range) => config.das.set_colorbar_range(range),
            Control::FiberTime(selection) => config.das.set_time(selection),
            Control::FiberDownsample([time, depth]) => config.das.set_downsample(time, depth)?,
            Control::AxisRange { axis, min, max } => config.layout.set_axis_range(axis, min, max),
            Control::AspectMode(mode) => config.layout.set_aspect_mode(&mode)?,
            Control::AspectRatio(r) => config.layout.set_aspect_ratio(r.x, r.y, r.z),
            Control::Title(title) => config.layout.set_title(title),
            Control::ResetCamera => *camera = None,
        }
        Ok(())
    }

    fn rebuild(&mut self) {
        self.state = SessionState::Rebuilding;
        let scene = compose(&self.sources, &self.config, self.camera.as_ref());
        self.scene = Arc::new(scene);
        self.rebuilds += 1;
        self.state = SessionState::Idle;
        tracing::debug!("Scene rebuilt ({} traces, rebuild #{})", self.scene.data.len(), self.rebuilds);
    }

    /// All sources with the static layout and the current source settings.
    pub fn static_scene(&self) -> Scene {
        let config = SceneConfig {
            layout: self.static_layout.clone(),
            ..self.config.clone()
        };
        compose(&self.sources, &config, None)
    }

    /// Waterfall grid of the fiber signal, `None` without fiber data.
    pub fn waterfall(&self, selected: Option<&TargetTime>) -> Option<WaterfallGrid> {
        let fiber = self.sources.fiber.as_ref()?;
        let range = fiber_color_range(&fiber.series, &self.config.das);
        Some(prepare_waterfall(&fiber.series, &self.config.das, range, selected))
    }

    /// Fiber signal against depth at one sample, `None` without fiber data.
    pub fn profile(&self, index: usize) -> Option<DepthProfile> {
        prepare_profile(&self.sources.fiber.as_ref()?.series, index)
    }

    /// Cumulative event animation over the current time window, `None`
    /// without a catalog.
    pub fn animation(&self) -> Option<Result<Scene, TraceError>> {
        let catalog = self.sources.catalog.as_ref()?;
        Some(compose_event_animation(catalog, &self.config.ms))
    }

    pub fn fiber_time_range(&self) -> Option<Result<TimeRange, AlignmentError>> {
        self.sources.fiber.as_ref().map(|f| time_range(&f.series))
    }

    pub fn options(&self) -> ViewerOptions {
        let catalog = self.sources.catalog.as_deref();
        ViewerOptions {
            attributes: catalog.map(|c| c.attribute_names()).unwrap_or_default(),
            colorscales: Colorscale::names(),
            aspect_modes: AspectMode::ALL.iter().map(|m| m.as_str()).collect(),
            event_times: catalog
                .map(|c| {
                    c.origin_times()
                        .iter()
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
                        .collect()
                })
                .unwrap_or_default(),
            fiber_samples: self.sources.fiber.as_ref().map(|f| f.series.sample_count()).unwrap_or(0),
            has_events: catalog.is_some(),
            has_fiber: self.sources.fiber.is_some(),
            color_by: self.config.ms.color_by.clone(),
            size_by: self.config.ms.size_by.clone(),
        }
    }
}
