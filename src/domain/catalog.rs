// Microseismic event catalog domain model
use crate::domain::bounds::Bounds3;
use chrono::NaiveDateTime;
use indexmap::IndexMap;

pub const BRUNE_MAGNITUDE: &str = "Brune Magnitude";
pub const STAGE: &str = "Stage";

#[derive(Debug, Clone, PartialEq)]
pub struct MsEvent {
    pub file_name: String,
    pub easting: f64,
    pub northing: f64,
    pub depth_tvdss: f64,
    pub origin: NaiveDateTime,
    pub brune_magnitude: f64,
    pub stage: i64,
    pub extra: IndexMap<String, f64>,
}

impl MsEvent {
    /// Numeric value of a named column, if the event has one.
    pub fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            BRUNE_MAGNITUDE => Some(self.brune_magnitude),
            STAGE => Some(self.stage as f64),
            other => self.extra.get(other).copied(),
        }
    }

    pub fn hover_text(&self) -> String {
        format!(
            "File: {}<br>Stage: {}<br>Magnitude: {:.2}",
            self.file_name, self.stage, self.brune_magnitude
        )
    }

    pub fn has_finite_position(&self) -> bool {
        self.easting.is_finite() && self.northing.is_finite() && self.depth_tvdss.is_finite()
    }
}

/// Immutable set of events, ordered by origin time.
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    events: Vec<MsEvent>,
    origin_times: Vec<NaiveDateTime>,
}

impl EventCatalog {
    pub fn new(mut events: Vec<MsEvent>) -> Self {
        events.sort_by_key(|e| e.origin);
        let mut origin_times: Vec<NaiveDateTime> = events.iter().map(|e| e.origin).collect();
        origin_times.dedup();
        Self {
            events,
            origin_times,
        }
    }

    pub fn events(&self) -> &[MsEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sorted unique origin times, the positions of the event time slider.
    pub fn origin_times(&self) -> &[NaiveDateTime] {
        &self.origin_times
    }

    /// Events with `start <= origin <= end`; open bounds are unbounded.
    pub fn window(&self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Vec<&MsEvent> {
        self.events
            .iter()
            .filter(|e| start.is_none_or(|s| e.origin >= s))
            .filter(|e| end.is_none_or(|t| e.origin <= t))
            .collect()
    }

    /// Columns usable for color or size encoding.
    pub fn attribute_names(&self) -> Vec<String> {
        let mut names = vec![STAGE.to_string(), BRUNE_MAGNITUDE.to_string()];
        for event in &self.events {
            for key in event.extra.keys() {
                if !names.iter().any(|n| n == key) {
                    names.push(key.clone());
                }
            }
        }
        names
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        name == STAGE || name == BRUNE_MAGNITUDE || self.events.iter().any(|e| e.extra.contains_key(name))
    }

    pub fn bounds(&self) -> Option<Bounds3> {
        let xs: Vec<f64> = self.events.iter().map(|e| e.easting).collect();
        let ys: Vec<f64> = self.events.iter().map(|e| e.northing).collect();
        let zs: Vec<f64> = self.events.iter().map(|e| e.depth_tvdss).collect();
        Bounds3::from_columns(&xs, &ys, &zs)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::time_series::parse_datetime;

    pub(crate) fn event(name: &str, origin: &str, magnitude: f64, stage: i64, position: [f64; 3]) -> MsEvent {
        MsEvent {
            file_name: name.to_string(),
            easting: position[0],
            northing: position[1],
            depth_tvdss: position[2],
            origin: parse_datetime(origin).unwrap(),
            brune_magnitude: magnitude,
            stage,
            extra: IndexMap::new(),
        }
    }

    #[test]
    fn test_catalog_sorted_with_unique_times() {
        let catalog = EventCatalog::new(vec![
            event("c", "2024-05-01 00:00:02", -1.0, 2, [0.0, 0.0, 0.0]),
            event("a", "2024-05-01 00:00:00", -1.5, 1, [0.0, 0.0, 0.0]),
            event("b", "2024-05-01 00:00:00", -0.5, 1, [0.0, 0.0, 0.0]),
        ]);
        let names: Vec<&str> = catalog.events().iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(catalog.origin_times().len(), 2);
    }

    #[test]
    fn test_window_is_inclusive() {
        let catalog = EventCatalog::new(vec![
            event("a", "2024-05-01 00:00:00", -1.0, 1, [0.0, 0.0, 0.0]),
            event("b", "2024-05-01 00:00:05", -1.0, 1, [0.0, 0.0, 0.0]),
            event("c", "2024-05-01 00:00:10", -1.0, 1, [0.0, 0.0, 0.0]),
        ]);
        let start = parse_datetime("2024-05-01 00:00:05").ok();
        let end = parse_datetime("2024-05-01 00:00:10").ok();
        assert_eq!(catalog.window(start, end).len(), 2);
        assert_eq!(catalog.window(None, start).len(), 2);
        assert_eq!(catalog.window(None, None).len(), 3);
    }

    #[test]
    fn test_attribute_lookup() {
        let mut e = event("a", "2024-05-01", -1.25, 7, [1.0, 2.0, 3.0]);
        e.extra.insert("Moment".to_string(), 4.0e9);
        assert_eq!(e.attribute(STAGE), Some(7.0));
        assert_eq!(e.attribute(BRUNE_MAGNITUDE), Some(-1.25));
        assert_eq!(e.attribute("Moment"), Some(4.0e9));
        assert_eq!(e.attribute("Missing"), None);
        assert_eq!(e.hover_text(), "File: a<br>Stage: 7<br>Magnitude: -1.25");

        let catalog = EventCatalog::new(vec![e]);
        assert_eq!(catalog.attribute_names(), vec!["Stage", "Brune Magnitude", "Moment"]);
        assert!(catalog.has_attribute("Moment"));
    }
}
