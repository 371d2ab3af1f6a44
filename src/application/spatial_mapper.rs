// Spatial mapper - places fiber channels and events in well coordinates
use crate::domain::catalog::MsEvent;
use crate::domain::error::MappingError;
use crate::domain::trajectory::{Trajectory, TrajectoryPoint};

pub const FEET_PER_METER: f64 = 3.28084;

/// Easting, northing and TVDSS columns, one entry per placed sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coordinates {
    pub easting: Vec<f64>,
    pub northing: Vec<f64>,
    pub tvdss: Vec<f64>,
}

impl Coordinates {
    pub fn len(&self) -> usize {
        self.easting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.easting.is_empty()
    }
}

/// Projected planar origin that relative well offsets are added to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedOrigin {
    pub easting: f64,
    pub northing: f64,
}

pub fn meters_to_feet(distances_m: &[f64]) -> Vec<f64> {
    distances_m.iter().map(|d| d * FEET_PER_METER).collect()
}

pub fn clip_distances(distances: &[f64], max: f64) -> Vec<f64> {
    distances.iter().map(|d| d.clamp(0.0, max)).collect()
}

/// Piecewise-linear interpolation over increasing `xs`; holds the end values
/// outside the covered interval.
pub fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    let upper = xs.partition_point(|&v| v <= x);
    let lower = upper - 1;
    let frac = (x - xs[lower]) / (xs[upper] - xs[lower]);
    ys[lower] + frac * (ys[upper] - ys[lower])
}

/// Positions of fiber channels along a well.
///
/// Distances are converted from meters to feet and pinned to the extent of
/// the trajectory before each axis is interpolated against arc length.
pub fn map_fiber_to_trajectory(
    trajectory: &Trajectory,
    fiber_distances_m: &[f64],
) -> Result<Coordinates, MappingError> {
    if trajectory.len() < 2 {
        return Err(MappingError::InsufficientTrajectory {
            well: trajectory.name().to_string(),
            points: trajectory.len(),
        });
    }

    let arc = trajectory.arc_length();
    let distances = clip_distances(&meters_to_feet(fiber_distances_m), trajectory.max_arc_length());
    let (eastings, northings, depths) = (trajectory.eastings(), trajectory.northings(), trajectory.depths());

    let mut coords = Coordinates::default();
    for d in distances {
        coords.easting.push(interpolate(arc, &eastings, d));
        coords.northing.push(interpolate(arc, &northings, d));
        coords.tvdss.push(interpolate(arc, &depths, d));
    }
    Ok(coords)
}

/// Shifts relative well offsets onto a projected origin.
pub fn reference_trajectory(name: &str, offsets: &[TrajectoryPoint], origin: ProjectedOrigin) -> Trajectory {
    let points = offsets
        .iter()
        .map(|p| TrajectoryPoint::new(origin.easting + p.easting, origin.northing + p.northing, p.tvdss))
        .collect();
    Trajectory::new(name, points)
}

/// Event coordinates as recorded; events without a finite position are left out.
pub fn place_events<'a>(events: &[&'a MsEvent]) -> (Coordinates, Vec<&'a MsEvent>) {
    let mut coords = Coordinates::default();
    let mut placed = Vec::with_capacity(events.len());
    for event in events {
        if !event.has_finite_position() {
            tracing::debug!("Skipping event {} without a finite position", event.file_name);
            continue;
        }
        coords.easting.push(event.easting);
        coords.northing.push(event.northing);
        coords.tvdss.push(event.depth_tvdss);
        placed.push(*event);
    }
    (coords, placed)
}
