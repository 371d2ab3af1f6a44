// Time alignment engine - nearest-sample lookup across heterogeneous time axes
use crate::domain::error::AlignmentError;
use crate::domain::time_series::{TargetTime, TimeSeries, seconds_between};
use chrono::NaiveDateTime;
use serde::Serialize;

const DATETIME_GAP_WARN_S: f64 = 60.0;
const NUMERIC_GAP_WARN_S: f64 = 1.0;

/// Index of the sample closest to `target`.
///
/// Ties resolve to the lowest index and targets outside the axis land on the
/// nearer endpoint. Sorted axes are searched with a binary search, anything
/// else with a full scan.
pub fn nearest_index(axis: &[f64], target: f64) -> Option<usize> {
    if axis.is_empty() {
        return None;
    }
    if axis.is_sorted() {
        Some(nearest_sorted(axis, target))
    } else {
        Some(nearest_scan(axis, target))
    }
}

fn nearest_sorted(axis: &[f64], target: f64) -> usize {
    let upper = axis.partition_point(|&v| v < target);
    let pick = if upper == 0 {
        0
    } else if upper == axis.len() {
        axis.len() - 1
    } else {
        let below = upper - 1;
        if target - axis[below] <= axis[upper] - target {
            below
        } else {
            upper
        }
    };
    // step back over repeated timestamps
    let mut first = pick;
    while first > 0 && axis[first - 1] == axis[pick] {
        first -= 1;
    }
    first
}

fn nearest_scan(axis: &[f64], target: f64) -> usize {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in axis.iter().enumerate() {
        let diff = (v - target).abs();
        if diff.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, d)| diff < d) {
            best = Some((i, diff));
        }
    }
    best.map(|(i, _)| i).unwrap_or(0)
}

/// Nearest indices for both ends of a range, ordered and in bounds.
pub fn nearest_range(axis: &[f64], start: f64, end: f64) -> Option<(usize, usize)> {
    let last = axis.len().checked_sub(1)?;
    let a = nearest_index(axis, start)?.min(last);
    let b = nearest_index(axis, end)?.min(last);
    Some(if b < a { (b, a) } else { (a, b) })
}

/// Nearest sample of `series` for a datetime or a second offset.
pub fn nearest_time_index(series: &TimeSeries, target: &TargetTime) -> Result<usize, AlignmentError> {
    match target {
        TargetTime::Seconds(seconds) => {
            let axis = series.taxis();
            let index = nearest_index(axis, *seconds).ok_or(AlignmentError::EmptyAxis)?;
            let gap = (axis[index] - seconds).abs();
            if gap > NUMERIC_GAP_WARN_S {
                tracing::warn!("Nearest fiber sample is {:.3}s away from requested {:.2}s", gap, seconds);
            }
            tracing::debug!("Numeric time {:.2}s -> index {} ({:.2}s)", seconds, index, axis[index]);
            Ok(index)
        }
        TargetTime::Datetime(datetime) => {
            let reference = series
                .time_reference()
                .ok_or(AlignmentError::MissingTimeReference)?;
            let start = reference.start().ok_or(AlignmentError::EmptyAxis)?;
            let offsets = reference.offsets_s();
            let target_s = seconds_between(start, *datetime);
            let index = nearest_index(&offsets, target_s).ok_or(AlignmentError::EmptyAxis)?;
            let gap = (offsets[index] - target_s).abs();
            if gap > DATETIME_GAP_WARN_S {
                tracing::warn!("Nearest fiber sample is {:.1}s away from requested time {}", gap, datetime);
            }
            tracing::debug!("Datetime {} -> index {} (difference {:.3}s)", datetime, index, gap);
            Ok(index)
        }
    }
}

/// Range lookup on a series; indices are swapped into order when needed.
pub fn time_index_range(
    series: &TimeSeries,
    start: &TargetTime,
    end: &TargetTime,
) -> Result<(usize, usize), AlignmentError> {
    let a = nearest_time_index(series, start)?;
    let b = nearest_time_index(series, end)?;
    Ok(if b < a { (b, a) } else { (a, b) })
}

/// Pins an index into `[0, len - 1]`, logging when it had to move.
pub fn clamp_index(index: usize, len: usize) -> Option<usize> {
    let last = len.checked_sub(1)?;
    if index > last {
        tracing::warn!("Time index {} out of range for {} samples, clamping to {}", index, len, last);
        return Some(last);
    }
    Some(index)
}

/// Maps a position in a sorted event time sequence onto the fiber time axis.
///
/// The event timestamp is converted to an offset from the fiber start epoch
/// and looked up there. Without an epoch the position is scaled by the length
/// ratio of the two sequences instead.
pub fn cross_map_index(source_times: &[NaiveDateTime], source_index: usize, target: &TimeSeries) -> Option<usize> {
    let target_len = target.sample_count();
    if target_len == 0 || source_times.is_empty() {
        return None;
    }
    let source_index = source_index.min(source_times.len() - 1);
    match map_by_time(source_times[source_index], target) {
        Ok(index) => Some(index),
        Err(e) => {
            tracing::debug!("Falling back to proportional time mapping: {}", e);
            Some(proportional_index(source_index, source_times.len(), target_len))
        }
    }
}

fn map_by_time(time: NaiveDateTime, target: &TimeSeries) -> Result<usize, AlignmentError> {
    let reference = target
        .time_reference()
        .ok_or(AlignmentError::MissingTimeReference)?;
    let start = reference.start().ok_or(AlignmentError::EmptyAxis)?;
    let offset = seconds_between(start, time);
    nearest_index(&reference.offsets_s(), offset).ok_or(AlignmentError::EmptyAxis)
}

pub fn proportional_index(source_index: usize, source_len: usize, target_len: usize) -> usize {
    if source_len == 0 || target_len == 0 {
        return 0;
    }
    let scaled = source_index as f64 * (target_len as f64 / source_len as f64);
    (scaled.floor() as usize).min(target_len - 1)
}

/// Time coverage of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_s: f64,
    pub duration_hours: f64,
    pub total_samples: usize,
}

pub fn time_range(series: &TimeSeries) -> Result<TimeRange, AlignmentError> {
    let reference = series
        .time_reference()
        .ok_or(AlignmentError::MissingTimeReference)?;
    let times: Vec<NaiveDateTime> = (0..reference.len())
        .filter_map(|i| reference.datetime_at(i))
        .collect();
    if times.len() < reference.len() {
        tracing::warn!(
            "{} of {} samples fall outside the representable time range and were skipped",
            reference.len() - times.len(),
            reference.len()
        );
    }
    let start = times.iter().min().copied().ok_or(AlignmentError::EmptyAxis)?;
    let end = times.iter().max().copied().ok_or(AlignmentError::EmptyAxis)?;
    let duration_s = seconds_between(start, end);
    Ok(TimeRange {
        start,
        end,
        duration_s,
        duration_hours: duration_s / 3600.0,
        total_samples: times.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::time_series::{TimeAxisKind, parse_datetime};

    fn at(s: &str) -> NaiveDateTime {
        parse_datetime(s).unwrap()
    }

    fn series(taxis: Vec<f64>, reference: Option<TimeAxisKind>) -> TimeSeries {
        let rows = vec![vec![0.0; taxis.len()]];
        TimeSeries::new(taxis, vec![0.0], rows, reference).unwrap()
    }

    fn brute_force(axis: &[f64], target: f64) -> usize {
        let mut best = 0;
        for i in 0..axis.len() {
            if (axis[i] - target).abs() < (axis[best] - target).abs() {
                best = i;
            }
        }
        best
    }

    #[test]
    fn test_nearest_index_rounds_to_closer_sample() {
        let axis = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(nearest_index(&axis, 2.6), Some(3));
        assert_eq!(nearest_index(&axis, 2.4), Some(2));
    }

    #[test]
    fn test_nearest_index_ties_take_lowest_index() {
        assert_eq!(nearest_index(&[0.0, 1.0, 2.0], 1.5), Some(1));
        assert_eq!(nearest_index(&[0.0, 0.0, 1.0], 0.4), Some(0));
        assert_eq!(nearest_index(&[0.0, 1.0, 1.0, 1.0], 5.0), Some(1));
    }

    #[test]
    fn test_nearest_index_clamps_outside_targets() {
        let axis = [10.0, 20.0, 30.0];
        assert_eq!(nearest_index(&axis, -100.0), Some(0));
        assert_eq!(nearest_index(&axis, 1e9), Some(2));
        assert_eq!(nearest_index(&[], 1.0), None);
    }

    #[test]
    fn test_nearest_index_matches_global_search() {
        let axis = [0.0, 0.5, 0.5, 1.25, 3.0, 3.5, 8.0, 8.0, 9.75];
        for step in -20..220 {
            let target = step as f64 * 0.05;
            assert_eq!(nearest_index(&axis, target), Some(brute_force(&axis, target)), "target {target}");
        }
    }

    #[test]
    fn test_unsorted_axis_uses_scan() {
        let axis = [5.0, 1.0, 3.0, 1.0];
        assert_eq!(nearest_index(&axis, 1.1), Some(1));
        assert_eq!(nearest_index(&axis, 4.1), Some(0));
    }

    #[test]
    fn test_nearest_range_is_ordered() {
        let axis = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(nearest_range(&axis, 2.9, 0.2), Some((0, 3)));
        assert_eq!(nearest_range(&axis, -5.0, 50.0), Some((0, 3)));
        for (s, e) in [(0.0, 0.0), (3.0, 1.0), (1.6, 1.4)] {
            let (a, b) = nearest_range(&axis, s, e).unwrap();
            assert!(a <= b);
        }
    }

    #[test]
    fn test_numeric_target_uses_offsets() {
        let s = series(vec![0.0, 1.0, 2.0, 3.0, 4.0], None);
        assert_eq!(nearest_time_index(&s, &TargetTime::Seconds(2.6)), Ok(3));
    }

    #[test]
    fn test_datetime_target_with_start_plus_offsets() {
        let taxis = vec![0.0, 1.0, 2.0, 3.0];
        let s = series(
            taxis.clone(),
            Some(TimeAxisKind::StartPlusOffsets {
                start: at("2024-05-01 00:00:00"),
                offsets_s: taxis,
            }),
        );
        let target = TargetTime::Datetime(at("2024-05-01 00:00:01.800"));
        assert_eq!(nearest_time_index(&s, &target), Ok(2));
    }

    #[test]
    fn test_datetime_target_with_explicit_datetimes() {
        let s = series(
            vec![0.0, 10.0, 20.0],
            Some(TimeAxisKind::ExplicitDatetimes(vec![
                at("2024-05-01 00:00:00"),
                at("2024-05-01 00:00:10"),
                at("2024-05-01 00:00:20"),
            ])),
        );
        let target = TargetTime::Datetime(at("2024-05-01 00:00:14"));
        assert_eq!(nearest_time_index(&s, &target), Ok(1));
        let after = TargetTime::Datetime(at("2024-05-02 00:00:00"));
        assert_eq!(nearest_time_index(&s, &after), Ok(2));
    }

    #[test]
    fn test_datetime_target_without_reference_fails() {
        let s = series(vec![0.0, 1.0], None);
        let target = TargetTime::Datetime(at("2024-05-01 00:00:00"));
        assert_eq!(nearest_time_index(&s, &target), Err(AlignmentError::MissingTimeReference));
    }

    #[test]
    fn test_time_index_range_swaps_reversed_bounds() {
        let s = series(vec![0.0, 1.0, 2.0, 3.0], None);
        let range = time_index_range(&s, &TargetTime::Seconds(2.8), &TargetTime::Seconds(0.9));
        assert_eq!(range, Ok((1, 3)));
    }

    #[test]
    fn test_clamp_index() {
        assert_eq!(clamp_index(7, 5), Some(4));
        assert_eq!(clamp_index(2, 5), Some(2));
        assert_eq!(clamp_index(0, 0), None);
    }

    #[test]
    fn test_cross_map_uses_fiber_epoch() {
        let taxis: Vec<f64> = (0..10).map(|i| i as f64 * 60.0).collect();
        let s = series(
            taxis.clone(),
            Some(TimeAxisKind::StartPlusOffsets {
                start: at("2024-05-01 00:00:00"),
                offsets_s: taxis,
            }),
        );
        let events = [
            at("2024-05-01 00:01:00"),
            at("2024-05-01 00:04:10"),
            at("2024-05-01 02:00:00"),
        ];
        assert_eq!(cross_map_index(&events, 0, &s), Some(1));
        assert_eq!(cross_map_index(&events, 1, &s), Some(4));
        assert_eq!(cross_map_index(&events, 2, &s), Some(9));
    }

    #[test]
    fn test_cross_map_falls_back_to_proportional_position() {
        let s = series((0..100).map(|i| i as f64).collect(), None);
        let events: Vec<NaiveDateTime> = (0..10).map(|i| at("2024-05-01") + chrono::TimeDelta::seconds(i)).collect();
        assert_eq!(cross_map_index(&events, 5, &s), Some(50));
        assert_eq!(cross_map_index(&events, 9, &s), Some(90));
        assert_eq!(proportional_index(3, 4, 2), 1);
    }

    #[test]
    fn test_time_range_summary() {
        let taxis = vec![0.0, 1800.0, 3600.0];
        let s = series(
            taxis.clone(),
            Some(TimeAxisKind::StartPlusOffsets {
                start: at("2024-05-01 00:00:00"),
                offsets_s: taxis,
            }),
        );
        let range = time_range(&s).unwrap();
        assert_eq!(range.start, at("2024-05-01 00:00:00"));
        assert_eq!(range.end, at("2024-05-01 01:00:00"));
        assert_eq!(range.duration_hours, 1.0);
        assert_eq!(range.total_samples, 3);
        assert_eq!(time_range(&series(vec![0.0], None)), Err(AlignmentError::MissingTimeReference));
    }

    #[test]
    fn test_time_range_skips_unrepresentable_offsets() {
        let taxis = vec![0.0, 1e15];
        let s = series(
            taxis.clone(),
            Some(TimeAxisKind::StartPlusOffsets {
                start: at("2024-05-01 00:00:00"),
                offsets_s: taxis,
            }),
        );
        let range = time_range(&s).unwrap();
        assert_eq!(range.start, at("2024-05-01 00:00:00"));
        assert_eq!(range.end, range.start);
        assert_eq!(range.total_samples, 1);
    }
}
