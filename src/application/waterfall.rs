// Waterfall preparation - downsampled depth x time grid of the fiber signal
use crate::application::spatial_mapper::meters_to_feet;
use crate::application::time_alignment::{clamp_index, nearest_time_index};
use crate::domain::colorscale::Colorscale;
use crate::domain::render_config::{ColorRange, DasRenderConfig};
use crate::domain::time_series::{TargetTime, TimeSeries};

/// Row-major grid, one row per kept channel and one column per kept sample.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallGrid {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
    pub range: Option<ColorRange>,
    pub colorscale: Colorscale,
    /// Column holding the selected time, if one was requested and matched.
    pub marker_column: Option<usize>,
}

impl WaterfallGrid {
    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.width + column]
    }
}

/// Keeps every `time`-th sample of every `depth`-th channel.
pub fn prepare_waterfall(
    series: &TimeSeries,
    config: &DasRenderConfig,
    range: Option<ColorRange>,
    selected: Option<&TargetTime>,
) -> WaterfallGrid {
    let step_t = config.downsample.time.max(1);
    let step_d = config.downsample.depth.max(1);

    let channels: Vec<usize> = (0..series.channel_count()).step_by(step_d).collect();
    let samples: Vec<usize> = (0..series.sample_count()).step_by(step_t).collect();

    let mut values = Vec::with_capacity(channels.len() * samples.len());
    for &channel in &channels {
        values.extend(samples.iter().map(|&sample| series.value(channel, sample)));
    }

    let marker_column = selected.and_then(|target| match nearest_time_index(series, target) {
        Ok(index) => Some((index / step_t).min(samples.len().saturating_sub(1))),
        Err(e) => {
            tracing::warn!("No waterfall marker for {:?}: {}", target, e);
            None
        }
    });

    tracing::debug!(
        "Waterfall {}x{} from {} channels x {} samples",
        samples.len(),
        channels.len(),
        series.channel_count(),
        series.sample_count()
    );

    WaterfallGrid {
        width: samples.len(),
        height: channels.len(),
        values,
        range,
        colorscale: config.colorscale,
        marker_column,
    }
}

/// Signal against depth at one sample of the recording.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthProfile {
    pub depths_ft: Vec<f64>,
    pub values: Vec<f64>,
    pub time_s: f64,
}

impl DepthProfile {
    pub fn title(&self) -> String {
        format!("DAS Time Slice at t = {:.4}", self.time_s)
    }
}

/// Profile at `index`, clamped into the recording.
pub fn prepare_profile(series: &TimeSeries, index: usize) -> Option<DepthProfile> {
    let index = clamp_index(index, series.sample_count())?;
    Some(DepthProfile {
        depths_ft: meters_to_feet(series.daxis()),
        values: series.time_slice(index)?,
        time_s: series.taxis()[index],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> TimeSeries {
        let rows = (0..4)
            .map(|c| (0..6).map(|s| (c * 10 + s) as f64).collect())
            .collect();
        TimeSeries::new(
            (0..6).map(|s| s as f64).collect(),
            vec![0.0, 1.0, 2.0, 3.0],
            rows,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_downsample_strides_by_time_then_depth() {
        let mut config = DasRenderConfig::default();
        config.set_downsample(2, 3).unwrap();
        let grid = prepare_waterfall(&series(), &config, None, None);
        assert_eq!((grid.width, grid.height), (3, 2));
        assert_eq!(grid.values, vec![0.0, 2.0, 4.0, 30.0, 32.0, 34.0]);
        assert_eq!(grid.value(1, 2), 34.0);
        assert_eq!(grid.marker_column, None);
    }

    #[test]
    fn test_marker_column_follows_selected_time() {
        let mut config = DasRenderConfig::default();
        config.set_downsample(2, 1).unwrap();
        let grid = prepare_waterfall(&series(), &config, None, Some(&TargetTime::Seconds(3.9)));
        assert_eq!(grid.marker_column, Some(2));
    }

    #[test]
    fn test_unit_stride_keeps_everything() {
        let mut config = DasRenderConfig::default();
        config.set_downsample(1, 1).unwrap();
        let range = Some(ColorRange::new(0.0, 35.0));
        let grid = prepare_waterfall(&series(), &config, range, None);
        assert_eq!(grid.values.len(), 24);
        assert_eq!(grid.range, range);
    }

    #[test]
    fn test_profile_is_one_sample_against_depth_in_feet() {
        let profile = prepare_profile(&series(), 2).unwrap();
        assert_eq!(profile.values, vec![2.0, 12.0, 22.0, 32.0]);
        assert_eq!(profile.depths_ft[1], 3.28084);
        assert_eq!(profile.title(), "DAS Time Slice at t = 2.0000");
    }

    #[test]
    fn test_profile_index_is_clamped() {
        assert_eq!(prepare_profile(&series(), 99).unwrap().time_s, 5.0);
    }
}
