// DAS time series domain model
use crate::domain::error::{AlignmentError, DataError};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::str::FromStr;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
];

/// Absolute time reference of a series.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeAxisKind {
    ExplicitDatetimes(Vec<NaiveDateTime>),
    StartPlusOffsets {
        start: NaiveDateTime,
        offsets_s: Vec<f64>,
    },
}

impl TimeAxisKind {
    pub fn len(&self) -> usize {
        match self {
            TimeAxisKind::ExplicitDatetimes(times) => times.len(),
            TimeAxisKind::StartPlusOffsets { offsets_s, .. } => offsets_s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Epoch the offsets are measured from.
    pub fn start(&self) -> Option<NaiveDateTime> {
        match self {
            TimeAxisKind::ExplicitDatetimes(times) => times.first().copied(),
            TimeAxisKind::StartPlusOffsets { start, .. } => Some(*start),
        }
    }

    /// Per-sample seconds relative to `start()`.
    pub fn offsets_s(&self) -> Cow<'_, [f64]> {
        match self {
            TimeAxisKind::ExplicitDatetimes(times) => match times.first() {
                Some(first) => Cow::Owned(times.iter().map(|t| seconds_between(*first, *t)).collect()),
                None => Cow::Owned(Vec::new()),
            },
            TimeAxisKind::StartPlusOffsets { offsets_s, .. } => Cow::Borrowed(offsets_s),
        }
    }

    pub fn datetime_at(&self, index: usize) -> Option<NaiveDateTime> {
        match self {
            TimeAxisKind::ExplicitDatetimes(times) => times.get(index).copied(),
            TimeAxisKind::StartPlusOffsets { start, offsets_s } => {
                offsets_s.get(index).and_then(|s| add_seconds(*start, *s))
            }
        }
    }
}

/// Channel x time signal matrix with its spatial and time axes.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    taxis: Vec<f64>,
    daxis: Vec<f64>,
    // row-major, one row per channel
    data: Vec<f64>,
    reference: Option<TimeAxisKind>,
}

impl TimeSeries {
    pub fn new(
        taxis: Vec<f64>,
        daxis: Vec<f64>,
        rows: Vec<Vec<f64>>,
        reference: Option<TimeAxisKind>,
    ) -> Result<Self, DataError> {
        if rows.len() != daxis.len() {
            return Err(DataError::ShapeMismatch {
                what: "signal channels",
                expected: daxis.len(),
                actual: rows.len(),
            });
        }
        if let Some(row) = rows.iter().find(|r| r.len() != taxis.len()) {
            return Err(DataError::ShapeMismatch {
                what: "signal samples",
                expected: taxis.len(),
                actual: row.len(),
            });
        }
        if let Some(kind) = &reference {
            if kind.len() != taxis.len() {
                return Err(DataError::ShapeMismatch {
                    what: "time reference",
                    expected: taxis.len(),
                    actual: kind.len(),
                });
            }
        }

        let data = rows.into_iter().flatten().collect();
        Ok(Self {
            taxis,
            daxis,
            data,
            reference,
        })
    }

    pub fn taxis(&self) -> &[f64] {
        &self.taxis
    }

    pub fn daxis(&self) -> &[f64] {
        &self.daxis
    }

    pub fn time_reference(&self) -> Option<&TimeAxisKind> {
        self.reference.as_ref()
    }

    pub fn channel_count(&self) -> usize {
        self.daxis.len()
    }

    pub fn sample_count(&self) -> usize {
        self.taxis.len()
    }

    pub fn value(&self, channel: usize, sample: usize) -> f64 {
        self.data[channel * self.taxis.len() + sample]
    }

    /// All values, channel-major.
    pub fn flattened(&self) -> &[f64] {
        &self.data
    }

    /// One value per channel at the given sample.
    pub fn time_slice(&self, sample: usize) -> Option<Vec<f64>> {
        if sample >= self.sample_count() {
            return None;
        }
        Some(
            (0..self.channel_count())
                .map(|ch| self.value(ch, sample))
                .collect(),
        )
    }
}

/// A point in time to align against a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTargetTime", into = "RawTargetTime")]
pub enum TargetTime {
    Datetime(NaiveDateTime),
    /// Seconds from the start of the series.
    Seconds(f64),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTargetTime {
    Seconds(f64),
    Text(String),
}

impl TryFrom<RawTargetTime> for TargetTime {
    type Error = AlignmentError;

    fn try_from(raw: RawTargetTime) -> Result<Self, Self::Error> {
        match raw {
            RawTargetTime::Seconds(s) => Ok(TargetTime::Seconds(s)),
            RawTargetTime::Text(text) => parse_datetime(&text).map(TargetTime::Datetime),
        }
    }
}

impl From<TargetTime> for RawTargetTime {
    fn from(target: TargetTime) -> Self {
        match target {
            TargetTime::Seconds(s) => RawTargetTime::Seconds(s),
            TargetTime::Datetime(dt) => RawTargetTime::Text(dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string()),
        }
    }
}

impl FromStr for TargetTime {
    type Err = AlignmentError;

    /// Plain numbers are second offsets, anything else must be a datetime.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<f64>() {
            Ok(seconds) => Ok(TargetTime::Seconds(seconds)),
            Err(_) => parse_datetime(s).map(TargetTime::Datetime),
        }
    }
}

pub fn parse_datetime(text: &str) -> Result<NaiveDateTime, AlignmentError> {
    let text = text.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| AlignmentError::UnparseableTime(text.to_string()))
}

pub fn seconds_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// `None` when the offset is not finite or leaves the representable range.
pub fn add_seconds(start: NaiveDateTime, seconds: f64) -> Option<NaiveDateTime> {
    let micros = seconds * 1e6;
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    start.checked_add_signed(TimeDelta::microseconds(micros.round() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        parse_datetime(s).unwrap()
    }

    #[test]
    fn test_rejects_channel_count_mismatch() {
        let err = TimeSeries::new(vec![0.0, 1.0], vec![0.0], vec![vec![1.0, 2.0], vec![3.0, 4.0]], None)
            .unwrap_err();
        assert_eq!(
            err,
            DataError::ShapeMismatch {
                what: "signal channels",
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn test_rejects_sample_count_mismatch() {
        let err = TimeSeries::new(vec![0.0, 1.0, 2.0], vec![0.0], vec![vec![1.0, 2.0]], None).unwrap_err();
        assert!(matches!(err, DataError::ShapeMismatch { what: "signal samples", .. }));
    }

    #[test]
    fn test_time_slice_reads_one_value_per_channel() {
        let series = TimeSeries::new(
            vec![0.0, 1.0, 2.0],
            vec![0.0, 10.0],
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
            None,
        )
        .unwrap();
        assert_eq!(series.time_slice(1), Some(vec![2.0, 5.0]));
        assert_eq!(series.time_slice(3), None);
        assert_eq!(series.flattened(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_explicit_datetimes_offsets_from_first_sample() {
        let kind = TimeAxisKind::ExplicitDatetimes(vec![
            at("2024-05-01 00:00:00"),
            at("2024-05-01 00:00:01.500"),
        ]);
        assert_eq!(kind.offsets_s().as_ref(), &[0.0, 1.5]);
        assert_eq!(kind.start(), Some(at("2024-05-01 00:00:00")));
    }

    #[test]
    fn test_start_plus_offsets_datetime_at() {
        let kind = TimeAxisKind::StartPlusOffsets {
            start: at("2024-05-01 00:00:00"),
            offsets_s: vec![0.0, 0.25],
        };
        assert_eq!(kind.datetime_at(1), Some(at("2024-05-01 00:00:00.250")));
        assert_eq!(kind.datetime_at(2), None);
    }

    #[test]
    fn test_offsets_outside_datetime_range_resolve_to_none() {
        let start = at("2024-05-01 00:00:00");
        assert_eq!(add_seconds(start, 1.5), Some(at("2024-05-01 00:00:01.500")));
        assert_eq!(add_seconds(start, 1e15), None);
        assert_eq!(add_seconds(start, f64::NAN), None);
        assert_eq!(add_seconds(start, -f64::INFINITY), None);
    }

    #[test]
    fn test_target_time_from_str() {
        assert_eq!("2.5".parse::<TargetTime>().unwrap(), TargetTime::Seconds(2.5));
        assert_eq!(
            "2024-05-01T12:30:00".parse::<TargetTime>().unwrap(),
            TargetTime::Datetime(at("2024-05-01 12:30:00"))
        );
        assert!("yesterday".parse::<TargetTime>().is_err());
    }

    #[test]
    fn test_target_time_deserializes_number_or_string() {
        let seconds: TargetTime = serde_json::from_str("12").unwrap();
        assert_eq!(seconds, TargetTime::Seconds(12.0));
        let dt: TargetTime = serde_json::from_str("\"2024-05-01\"").unwrap();
        assert_eq!(dt, TargetTime::Datetime(at("2024-05-01 00:00:00")));
    }
}
