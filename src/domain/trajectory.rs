// Well trajectory domain model
use crate::domain::bounds::Bounds3;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub easting: f64,
    pub northing: f64,
    pub tvdss: f64,
}

impl TrajectoryPoint {
    pub fn new(easting: f64, northing: f64, tvdss: f64) -> Self {
        Self {
            easting,
            northing,
            tvdss,
        }
    }

    pub fn distance_to(&self, other: &TrajectoryPoint) -> f64 {
        let de = other.easting - self.easting;
        let dn = other.northing - self.northing;
        let dz = other.tvdss - self.tvdss;
        (de * de + dn * dn + dz * dz).sqrt()
    }
}

/// Polyline of one well, ordered by increasing depth.
#[derive(Debug, Clone)]
pub struct Trajectory {
    name: String,
    points: Vec<TrajectoryPoint>,
    arc_length: Vec<f64>,
}

impl Trajectory {
    pub fn new(name: impl Into<String>, mut points: Vec<TrajectoryPoint>) -> Self {
        sort_by_depth(&mut points);
        let arc_length = cumulative_arc_length(&points);
        Self {
            name: name.into(),
            points,
            arc_length,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Cumulative 3D distance from the first point, same length as `points()`.
    pub fn arc_length(&self) -> &[f64] {
        &self.arc_length
    }

    pub fn max_arc_length(&self) -> f64 {
        self.arc_length.last().copied().unwrap_or(0.0)
    }

    pub fn eastings(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.easting).collect()
    }

    pub fn northings(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.northing).collect()
    }

    pub fn depths(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.tvdss).collect()
    }

    pub fn bounds(&self) -> Option<Bounds3> {
        Bounds3::from_columns(&self.eastings(), &self.northings(), &self.depths())
    }
}

/// Stable sort by TVDSS, shallowest first.
pub fn sort_by_depth(points: &mut [TrajectoryPoint]) {
    points.sort_by(|a, b| a.tvdss.total_cmp(&b.tvdss));
}

pub fn cumulative_arc_length(points: &[TrajectoryPoint]) -> Vec<f64> {
    let mut total = 0.0;
    let mut cumulative = Vec::with_capacity(points.len());
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            total += points[i - 1].distance_to(point);
        }
        cumulative.push(total);
    }
    cumulative
}
