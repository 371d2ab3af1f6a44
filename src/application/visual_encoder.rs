// Signal-to-visual encoder - color ranges, marker sizes and length reconciliation
use crate::domain::bounds::Extent;
use crate::domain::colorscale::Colorscale;
use crate::domain::error::EncodeError;
use crate::domain::render_config::{ColorRange, LengthPolicy};
use crate::domain::scene::{ColorBar, Marker, MarkerColor, MarkerSize};

/// Diameter multiplier applied to absolute magnitudes.
pub const SIZE_MULTIPLIER: f64 = 100.0;
pub const SIZE_REF: f64 = 25.0;

/// Explicit range verbatim, otherwise the extent of the active view.
pub fn resolve_color_range(explicit: Option<ColorRange>, view: &[f64]) -> Option<ColorRange> {
    explicit.or_else(|| value_range(view))
}

pub fn value_range(values: &[f64]) -> Option<ColorRange> {
    Extent::of(values.iter().copied()).map(|e| ColorRange::new(e.min, e.max))
}

/// Point diameters proportional to event strength, sign ignored.
pub fn encode_sizes(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v.abs() * SIZE_MULTIPLIER).collect()
}

/// Forces `signal` to exactly `target_len` values.
///
/// Under the lenient policy a longer signal is truncated and a shorter one is
/// repeated end to end and then truncated. The strict policy refuses any
/// mismatch. An empty signal cannot be repeated and is always refused.
pub fn reconcile_length(signal: &[f64], target_len: usize, policy: LengthPolicy) -> Result<Vec<f64>, EncodeError> {
    if signal.len() == target_len {
        return Ok(signal.to_vec());
    }
    let mismatch = EncodeError::ShapeMismatch {
        signal: signal.len(),
        coords: target_len,
    };
    if policy == LengthPolicy::Strict || signal.is_empty() {
        return Err(mismatch);
    }

    tracing::warn!("{}, reconciling", mismatch);
    if signal.len() > target_len {
        return Ok(signal[..target_len].to_vec());
    }
    let repeats = target_len / signal.len() + 1;
    let mut tiled = signal.repeat(repeats);
    tiled.truncate(target_len);
    Ok(tiled)
}

/// Marker colored by `values` over a resolved range.
pub fn color_marker(
    values: Vec<f64>,
    range: Option<ColorRange>,
    colorscale: Colorscale,
    colorbar_title: &str,
    size: MarkerSize,
) -> Marker {
    Marker {
        size,
        sizemode: None,
        sizeref: None,
        color: MarkerColor::Values(values),
        colorscale: Some(colorscale.plotly_stops()),
        cmin: range.map(|r| r.min),
        cmax: range.map(|r| r.max),
        colorbar: Some(ColorBar::titled(colorbar_title)),
        opacity: None,
        line: None,
    }
}

/// Position of `value` inside `range` as a fraction in [0, 1].
pub fn normalize(value: f64, range: ColorRange) -> f64 {
    let span = range.max - range.min;
    if span == 0.0 || !span.is_finite() {
        return 0.5;
    }
    ((value - range.min) / span).clamp(0.0, 1.0)
}
