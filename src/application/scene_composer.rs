// Scene composer - merges per-source traces into one figure
use crate::application::trace_builder::{
    build_events_trace, build_fiber_trace, build_well_trace, resolve_fiber_sample,
};
use crate::domain::bounds::{Bounds3, Extent};
use crate::domain::catalog::EventCatalog;
use crate::domain::error::{MappingError, TraceError};
use crate::domain::render_config::{AspectMode, AspectRatio, AxisOverride, LayoutConfig, LayoutStyle, SceneConfig};
use crate::domain::scene::{
    AutoRange, AxisLayout, Camera, Font, Layout, Legend, Margin, Scene, SceneLayout, Title, Trace, TraceRole,
};
use crate::domain::time_series::TimeSeries;
use crate::domain::trajectory::Trajectory;
use std::sync::Arc;

const PRIMARY_COLORBAR_X: f64 = 1.02;
const SECONDARY_COLORBAR_OFFSET: f64 = 0.18;
const SECONDARY_COLORBAR_Y: f64 = 0.40;

/// Fiber signal and the well its fiber runs along.
#[derive(Debug, Clone)]
pub struct FiberSource {
    pub series: Arc<TimeSeries>,
    pub well: Option<String>,
}

/// Read-only snapshot of every loaded dataset.
#[derive(Debug, Clone, Default)]
pub struct SceneSources {
    pub catalog: Option<Arc<EventCatalog>>,
    pub wells: Vec<Arc<Trajectory>>,
    pub fiber: Option<FiberSource>,
}

impl SceneSources {
    pub fn well(&self, name: &str) -> Option<&Arc<Trajectory>> {
        self.wells.iter().find(|w| w.name() == name)
    }
}

/// Builds a complete scene from the sources and their configs.
///
/// Each source is built on its own; a source that fails is logged and left
/// out so the remaining traces still render.
pub fn compose(sources: &SceneSources, config: &SceneConfig, camera: Option<&Camera>) -> Scene {
    let mut traces = Vec::new();

    for (i, well) in sources.wells.iter().enumerate() {
        collect(&mut traces, "well", build_well_trace(well, i, &config.wells));
    }

    if let Some(catalog) = &sources.catalog {
        collect(&mut traces, "microseismic", build_events_trace(catalog, &config.ms));
    }

    if let Some(fiber) = &sources.fiber {
        let sample = resolve_fiber_sample(&fiber.series, &config.das, sources.catalog.as_deref(), &config.ms);
        let result = fiber_well(sources, fiber)
            .map_err(TraceError::from)
            .and_then(|well| build_fiber_trace(&fiber.series, well, &config.das, sample));
        collect(&mut traces, "DAS", result);
    }

    place_secondary_colorbars(&mut traces);

    Scene {
        data: traces,
        layout: build_layout(&config.layout, default_bounds(sources), camera),
        frames: Vec::new(),
    }
}

fn collect(traces: &mut Vec<Trace>, source: &str, result: Result<Trace, TraceError>) {
    match result {
        Ok(trace) => traces.push(trace),
        Err(e) => tracing::warn!("Omitting {} trace: {}", source, e),
    }
}

fn fiber_well<'a>(sources: &'a SceneSources, fiber: &FiberSource) -> Result<&'a Trajectory, MappingError> {
    let name = fiber.well.as_deref().ok_or(MappingError::NoFiberWell)?;
    sources
        .well(name)
        .map(|w| w.as_ref())
        .ok_or_else(|| MappingError::UnknownWell(name.to_string()))
}

/// Extent of the full event catalog, falling back to the wells.
pub fn default_bounds(sources: &SceneSources) -> Option<Bounds3> {
    if let Some(bounds) = sources.catalog.as_ref().and_then(|c| c.bounds()) {
        return Some(bounds);
    }
    sources
        .wells
        .iter()
        .filter_map(|w| w.bounds())
        .reduce(|a, b| a.union(&b))
}

/// Moves every secondary colorbar to the right of the events colorbar.
pub fn place_secondary_colorbars(traces: &mut [Trace]) {
    for trace in traces.iter_mut().filter(|t| t.role == TraceRole::Fiber) {
        if let Some(colorbar) = trace.colorbar_mut() {
            colorbar.x = Some(PRIMARY_COLORBAR_X + SECONDARY_COLORBAR_OFFSET);
            colorbar.xanchor = Some("left");
            colorbar.y = Some(SECONDARY_COLORBAR_Y);
            colorbar.yanchor = Some("middle");
        }
    }
}

fn build_layout(config: &LayoutConfig, bounds: Option<Bounds3>, camera: Option<&Camera>) -> Layout {
    // static views only pin axes the user entered
    let defaults = match config.style {
        LayoutStyle::Interactive => bounds,
        LayoutStyle::Static => None,
    };
    let x = resolve_axis(defaults.map(|b| b.x), config.x);
    let y = resolve_axis(defaults.map(|b| b.y), config.y);
    let z = resolve_axis(defaults.map(|b| b.z), config.z);

    let aspectratio = match config.aspect_mode {
        AspectMode::Manual => config.aspect_ratio.or_else(|| Some(ratio_from_extents(x, y, z))),
        _ => None,
    };

    let (width, height, legend_x, margin) = match config.style {
        LayoutStyle::Interactive => (1000, 700, 1.18, None),
        LayoutStyle::Static => (1200, 800, 1.3, Some(Margin { r: 200 })),
    };

    Layout {
        title: Title::new(config.title.clone()),
        width,
        height,
        scene: SceneLayout {
            xaxis: axis_layout("Easting (ft)", x, false),
            yaxis: axis_layout("Northing (ft)", y, false),
            zaxis: axis_layout("TVDSS (ft)", z, true),
            aspectmode: config.aspect_mode,
            aspectratio,
            camera: camera.cloned(),
        },
        legend: legend(legend_x),
        margin,
        sliders: Vec::new(),
        updatemenus: Vec::new(),
    }
}

pub(crate) fn legend(x: f64) -> Legend {
    Legend {
        x,
        y: 0.5,
        xanchor: "left",
        yanchor: "top",
        bordercolor: "Black",
        borderwidth: 1,
        bgcolor: "white",
        font: Font { size: 12 },
    }
}

/// Default extent with each user bound replacing its side independently.
pub fn resolve_axis(default: Option<Extent>, user: AxisOverride) -> Option<Extent> {
    match (default, user.min, user.max) {
        (_, Some(min), Some(max)) => Some(Extent::new(min, max)),
        (Some(d), Some(min), None) => Some(Extent::new(min, d.max)),
        (Some(d), None, Some(max)) => Some(Extent::new(d.min, max)),
        (Some(d), None, None) => Some(d),
        (None, _, _) => None,
    }
}

pub(crate) fn axis_layout(title: &str, extent: Option<Extent>, depth: bool) -> AxisLayout {
    match (extent, depth) {
        // depth increases downward: list the range deepest first
        (Some(e), true) => AxisLayout {
            title: Title::new(title),
            range: Some([e.max, e.min]),
            autorange: AutoRange::Off,
        },
        (Some(e), false) => AxisLayout {
            title: Title::new(title),
            range: Some([e.min, e.max]),
            autorange: AutoRange::Off,
        },
        (None, true) => AxisLayout {
            title: Title::new(title),
            range: None,
            autorange: AutoRange::Reversed,
        },
        (None, false) => AxisLayout {
            title: Title::new(title),
            range: None,
            autorange: AutoRange::On,
        },
    }
}

/// Axis spans normalized by the largest one.
pub fn ratio_from_extents(x: Option<Extent>, y: Option<Extent>, z: Option<Extent>) -> AspectRatio {
    let span = |e: Option<Extent>| e.map(|e| e.span().abs()).unwrap_or(0.0);
    let (sx, sy, sz) = (span(x), span(y), span(z));
    let largest = sx.max(sy).max(sz);
    if largest <= 0.0 || !largest.is_finite() {
        return AspectRatio { x: 1.0, y: 1.0, z: 1.0 };
    }
    AspectRatio {
        x: sx / largest,
        y: sy / largest,
        z: sz / largest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::trace_builder::FIBER_TRACE_NAME;
    use crate::domain::catalog::tests::event;
    use crate::domain::render_config::{Axis, DasTimeSelection};
    use crate::domain::scene::{MarkerColor, Vec3};
    use crate::domain::time_series::{TargetTime, parse_datetime};
    use crate::domain::trajectory::TrajectoryPoint;

    fn sources() -> SceneSources {
        let catalog = EventCatalog::new(vec![
            event("e1", "2024-05-01 00:00:00", -1.0, 1, [0.0, 0.0, 100.0]),
            event("e2", "2024-05-01 00:10:00", -2.0, 2, [400.0, 200.0, 300.0]),
        ]);
        let well = Trajectory::new(
            "F",
            vec![TrajectoryPoint::new(0.0, 0.0, 0.0), TrajectoryPoint::new(0.0, 0.0, 200.0)],
        );
        let series = TimeSeries::new(vec![0.0, 1.0], vec![0.0, 10.0], vec![vec![1.0, 2.0], vec![3.0, 4.0]], None)
            .unwrap();
        SceneSources {
            catalog: Some(Arc::new(catalog)),
            wells: vec![Arc::new(well)],
            fiber: Some(FiberSource {
                series: Arc::new(series),
                well: Some("F".to_string()),
            }),
        }
    }

    fn config() -> SceneConfig {
        SceneConfig::new(LayoutConfig::interactive("Viewer"))
    }

    #[test]
    fn test_traces_ordered_wells_events_fiber() {
        let scene = compose(&sources(), &config(), None);
        let roles: Vec<TraceRole> = scene.data.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![TraceRole::Well, TraceRole::Events, TraceRole::Fiber]);
    }

    #[test]
    fn test_failed_source_is_omitted_not_fatal() {
        let mut sources = sources();
        if let Some(fiber) = sources.fiber.as_mut() {
            fiber.well = Some("Missing".to_string());
        }
        let scene = compose(&sources, &config(), None);
        assert_eq!(scene.data.len(), 2);
        assert!(scene.trace(TraceRole::Fiber).is_none());
    }

    #[test]
    fn test_fiber_without_time_reference_shows_all_samples() {
        let mut config = config();
        let target = TargetTime::Datetime(parse_datetime("2024-05-01 00:05:00").unwrap());
        config.das.set_time(DasTimeSelection::At(target));
        let scene = compose(&sources(), &config, None);
        let fiber = scene.trace(TraceRole::Fiber).unwrap();
        assert_eq!(fiber.name, FIBER_TRACE_NAME);
        match &fiber.marker.as_ref().unwrap().color {
            MarkerColor::Values(values) => assert_eq!(values, &vec![1.0, 2.0]),
            MarkerColor::Uniform(_) => panic!("expected per-channel colors"),
        }
    }

    #[test]
    fn test_fiber_colorbar_offset_from_primary() {
        let scene = compose(&sources(), &config(), None);
        let fiber_bar = scene.trace(TraceRole::Fiber).unwrap().marker.as_ref().unwrap().colorbar.clone().unwrap();
        assert_eq!(fiber_bar.x, Some(1.2));
        assert_eq!(fiber_bar.y, Some(0.40));
        assert_eq!(fiber_bar.xanchor, Some("left"));
        let events_bar = scene.trace(TraceRole::Events).unwrap().marker.as_ref().unwrap().colorbar.clone().unwrap();
        assert_eq!(events_bar.x, None);
    }

    #[test]
    fn test_axis_defaults_from_catalog_and_depth_reversed() {
        let scene = compose(&sources(), &config(), None);
        assert_eq!(scene.layout.scene.xaxis.range, Some([0.0, 400.0]));
        assert_eq!(scene.layout.scene.zaxis.range, Some([300.0, 100.0]));
        assert_eq!(scene.layout.scene.xaxis.autorange, AutoRange::Off);
    }

    #[test]
    fn test_axis_falls_back_to_wells() {
        let mut sources = sources();
        sources.catalog = None;
        let scene = compose(&sources, &config(), None);
        assert_eq!(scene.layout.scene.zaxis.range, Some([200.0, 0.0]));
    }

    #[test]
    fn test_user_bound_overrides_one_side() {
        let mut cfg = config();
        cfg.layout.set_axis_range(Axis::X, Some(-50.0), None);
        let scene = compose(&sources(), &cfg, None);
        assert_eq!(scene.layout.scene.xaxis.range, Some([-50.0, 400.0]));
        assert_eq!(resolve_axis(None, AxisOverride { min: Some(1.0), max: None }), None);
    }

    #[test]
    fn test_manual_aspect_derived_from_extents() {
        let scene = compose(&sources(), &config(), None);
        assert_eq!(scene.layout.scene.aspectmode, AspectMode::Manual);
        assert_eq!(
            scene.layout.scene.aspectratio,
            Some(AspectRatio { x: 1.0, y: 0.5, z: 0.5 })
        );
        let mut cfg = config();
        cfg.layout.set_aspect_ratio(1.0, 1.0, 3.0);
        let scene = compose(&sources(), &cfg, None);
        assert_eq!(scene.layout.scene.aspectratio, Some(AspectRatio { x: 1.0, y: 1.0, z: 3.0 }));
    }

    #[test]
    fn test_static_style_leaves_axes_automatic() {
        let mut cfg = config();
        cfg.layout = LayoutConfig::static_view();
        let scene = compose(&sources(), &cfg, None);
        assert_eq!(scene.layout.scene.zaxis.autorange, AutoRange::Reversed);
        assert_eq!(scene.layout.scene.xaxis.range, None);
        assert_eq!(scene.layout.scene.aspectratio, None);
        assert_eq!((scene.layout.width, scene.layout.height), (1200, 800));
        assert_eq!(scene.layout.title.text, "Static 3D Viewer");
    }

    #[test]
    fn test_camera_reapplied() {
        let camera = Camera {
            eye: Vec3 { x: 2.0, y: 0.1, z: 0.3 },
            center: None,
            up: None,
            projection: None,
        };
        let scene = compose(&sources(), &config(), Some(&camera));
        assert_eq!(scene.layout.scene.camera, Some(camera));
        assert_eq!(compose(&sources(), &config(), None).layout.scene.camera, None);
    }
}
