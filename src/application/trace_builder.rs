// Trace builders - one pure function per data source
use crate::application::spatial_mapper::{map_fiber_to_trajectory, place_events};
use crate::application::time_alignment::{clamp_index, cross_map_index, nearest_time_index};
use crate::application::visual_encoder::{
    SIZE_REF, color_marker, encode_sizes, reconcile_length, resolve_color_range, value_range,
};
use crate::domain::catalog::{EventCatalog, MsEvent};
use crate::domain::error::{EncodeError, MappingError, TraceError};
use crate::domain::render_config::{
    ColorRange, DasRenderConfig, DasTimeSelection, MsRenderConfig, WellRenderConfig,
};
use crate::domain::scene::{LineStyle, MarkerSize, Trace, TraceMode, TraceRole};
use crate::domain::time_series::TimeSeries;
use crate::domain::trajectory::Trajectory;

pub const EVENTS_TRACE_NAME: &str = "Microseismic Events";
pub const FIBER_TRACE_NAME: &str = "DAS Signal";

pub fn build_well_trace(trajectory: &Trajectory, index: usize, config: &WellRenderConfig) -> Result<Trace, TraceError> {
    if trajectory.len() < 2 {
        return Err(MappingError::InsufficientTrajectory {
            well: trajectory.name().to_string(),
            points: trajectory.len(),
        }
        .into());
    }
    let color = if config.colors.is_empty() {
        None
    } else {
        Some(config.colors[index % config.colors.len()].clone())
    };

    let mut trace = Trace::scatter3d(format!("{} Well", trajectory.name()), TraceMode::Lines, TraceRole::Well);
    trace.x = trajectory.eastings();
    trace.y = trajectory.northings();
    trace.z = trajectory.depths();
    trace.line = Some(LineStyle {
        color,
        width: config.line_width,
    });
    Ok(trace)
}

/// Events inside the configured window, colored and sized by their attributes.
pub fn build_events_trace(catalog: &EventCatalog, config: &MsRenderConfig) -> Result<Trace, TraceError> {
    check_attributes(catalog, config)?;
    let (start, end) = config.window();
    let windowed = catalog.window(start, end);
    // auto range follows the windowed events, not the whole catalog
    let range = events_color_range(&windowed, config);
    Ok(events_trace(&windowed, config, range))
}

pub fn check_attributes(catalog: &EventCatalog, config: &MsRenderConfig) -> Result<(), EncodeError> {
    for attribute in [&config.color_by, &config.size_by] {
        if !catalog.has_attribute(attribute) {
            return Err(EncodeError::UnknownAttribute(attribute.clone()));
        }
    }
    Ok(())
}

/// Explicit range, else the extent of the color attribute over the placeable `events`.
pub fn events_color_range(events: &[&MsEvent], config: &MsRenderConfig) -> Option<ColorRange> {
    let colors: Vec<f64> = events
        .iter()
        .filter(|e| e.has_finite_position())
        .map(|e| e.attribute(&config.color_by).unwrap_or(f64::NAN))
        .collect();
    resolve_color_range(config.colorbar_range, &colors)
}

/// Marker trace for `events` with a caller-chosen color range.
pub fn events_trace(events: &[&MsEvent], config: &MsRenderConfig, range: Option<ColorRange>) -> Trace {
    let (coords, events) = place_events(events);

    let attribute = |name: &str| -> Vec<f64> {
        events
            .iter()
            .map(|e| e.attribute(name).unwrap_or(f64::NAN))
            .collect()
    };
    let colors = attribute(&config.color_by);
    let sizes = encode_sizes(&attribute(&config.size_by));

    let mut marker = color_marker(
        colors,
        range,
        config.colorscale,
        &config.color_by,
        MarkerSize::PerPoint(sizes),
    );
    marker.sizemode = Some("diameter");
    marker.sizeref = Some(SIZE_REF);

    let mut trace = Trace::scatter3d(EVENTS_TRACE_NAME, TraceMode::Markers, TraceRole::Events);
    trace.text = Some(events.iter().map(|e| e.hover_text()).collect());
    trace.x = coords.easting;
    trace.y = coords.northing;
    trace.z = coords.tvdss;
    trace.marker = Some(marker);
    trace
}

/// Explicit range, else the extent of the whole matrix so the waterfall and
/// the 3D trace agree on colors.
pub fn fiber_color_range(series: &TimeSeries, config: &DasRenderConfig) -> Option<ColorRange> {
    config.colorbar_range.or_else(|| value_range(series.flattened()))
}

/// Sample index the fiber trace shows, `None` for the flattened view.
pub fn resolve_fiber_sample(
    series: &TimeSeries,
    config: &DasRenderConfig,
    catalog: Option<&EventCatalog>,
    ms: &MsRenderConfig,
) -> Option<usize> {
    match &config.time {
        DasTimeSelection::Full => None,
        DasTimeSelection::Index(index) => clamp_index(*index, series.sample_count()),
        DasTimeSelection::At(target) => match nearest_time_index(series, target) {
            Ok(index) => Some(index),
            Err(e) => {
                tracing::warn!("Could not match fiber time {:?}: {}, showing all samples", target, e);
                None
            }
        },
        DasTimeSelection::FollowEvents => {
            let times = catalog?.origin_times();
            let source_index = match ms.window().1 {
                Some(end) => times.partition_point(|t| *t <= end).saturating_sub(1),
                None => times.len().saturating_sub(1),
            };
            cross_map_index(times, source_index, series)
        }
    }
}

/// Fiber channels placed along their well, colored by the selected sample.
pub fn build_fiber_trace(
    series: &TimeSeries,
    well: &Trajectory,
    config: &DasRenderConfig,
    sample: Option<usize>,
) -> Result<Trace, TraceError> {
    let coords = map_fiber_to_trajectory(well, series.daxis())?;

    let (signal, name) = match sample.and_then(|s| series.time_slice(s).map(|slice| (s, slice))) {
        Some((s, slice)) => (slice, format!("{} (t={:.3}s)", FIBER_TRACE_NAME, series.taxis()[s])),
        None => (series.flattened().to_vec(), FIBER_TRACE_NAME.to_string()),
    };
    let signal = reconcile_length(&signal, coords.len(), config.length_policy)?;
    let range = fiber_color_range(series, config);

    let mut marker = color_marker(
        signal,
        range,
        config.colorscale,
        FIBER_TRACE_NAME,
        MarkerSize::Uniform(config.marker_size),
    );
    marker.opacity = Some(1.0);
    marker.line = Some(LineStyle {
        color: None,
        width: 0.0,
    });

    let mut trace = Trace::scatter3d(name, TraceMode::Markers, TraceRole::Fiber);
    trace.x = coords.easting;
    trace.y = coords.northing;
    trace.z = coords.tvdss;
    trace.marker = Some(marker);
    Ok(trace)
}
