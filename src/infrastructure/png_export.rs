// Fiber image export - PNG data URIs for the waterfall heatmap and depth profiles
use crate::application::visual_encoder::normalize;
use crate::application::waterfall::{DepthProfile, WaterfallGrid};
use crate::domain::bounds::Extent;
use base64::Engine;
use image::{ImageFormat, Rgb, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;

const MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const MARKER_WIDTH: u32 = 3;
const MISSING_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const PROFILE_MARGIN: u32 = 20;
const PROFILE_GRID_LINES: usize = 4;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("waterfall grid is empty")]
    EmptyGrid,
    #[error("depth profile has no finite samples")]
    EmptyProfile,
    #[error("profile plot failed: {0}")]
    Plot(String),
    #[error(transparent)]
    Encode(#[from] image::ImageError),
}

/// Channels run top to bottom, samples left to right; each cell becomes a
/// `scale` x `scale` block.
pub fn render_waterfall(grid: &WaterfallGrid, scale: u32) -> Result<RgbImage, ExportError> {
    if grid.width == 0 || grid.height == 0 {
        return Err(ExportError::EmptyGrid);
    }
    let scale = scale.max(1);
    let width = grid.width as u32 * scale;
    let height = grid.height as u32 * scale;

    let image = RgbImage::from_fn(width, height, |x, y| {
        let column = (x / scale) as usize;
        let row = (y / scale) as usize;
        if let Some(marker) = grid.marker_column {
            let center = marker as u32 * scale + scale / 2;
            if x.abs_diff(center) <= MARKER_WIDTH / 2 {
                return MARKER_COLOR;
            }
        }
        let value = grid.value(row, column);
        match grid.range {
            Some(range) if value.is_finite() => Rgb(grid.colorscale.sample(normalize(value, range))),
            _ => MISSING_COLOR,
        }
    });
    Ok(image)
}

pub fn png_data_uri(image: &RgbImage) -> Result<String, ExportError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:image/png;base64,{}", encoded))
}

pub fn waterfall_data_uri(grid: &WaterfallGrid, scale: u32) -> Result<String, ExportError> {
    let image = render_waterfall(grid, scale)?;
    png_data_uri(&image)
}

fn padded(extent: Extent) -> Extent {
    let pad = if extent.span() > 0.0 { extent.span() * 0.05 } else { 1.0 };
    Extent::new(extent.min - pad, extent.max + pad)
}

/// Signal on x against depth on y, deepest at the bottom.
pub fn render_profile(profile: &DepthProfile, width: u32, height: u32) -> Result<RgbImage, ExportError> {
    let points: Vec<(f64, f64)> = profile
        .values
        .iter()
        .zip(&profile.depths_ft)
        .filter(|(v, d)| v.is_finite() && d.is_finite())
        .map(|(v, d)| (*v, *d))
        .collect();
    let values = Extent::of(points.iter().map(|p| p.0)).ok_or(ExportError::EmptyProfile)?;
    let depths = Extent::of(points.iter().map(|p| p.1)).ok_or(ExportError::EmptyProfile)?;

    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    draw_profile(&mut buffer, (width, height), &points, padded(values), padded(depths))
        .map_err(|e| ExportError::Plot(e.to_string()))?;
    RgbImage::from_raw(width, height, buffer).ok_or_else(|| ExportError::Plot("buffer size mismatch".to_string()))
}

fn draw_profile(
    buffer: &mut [u8],
    size: (u32, u32),
    points: &[(f64, f64)],
    values: Extent,
    depths: Extent,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::with_buffer(buffer, size).into_drawing_area();
    root.fill(&WHITE)?;
    // y holds negated depth so depth grows downward
    let mut chart = ChartBuilder::on(&root)
        .margin(PROFILE_MARGIN)
        .build_cartesian_2d(values.min..values.max, -depths.max..-depths.min)?;

    let grid = RGBColor(200, 200, 200);
    for i in 0..=PROFILE_GRID_LINES {
        let f = i as f64 / PROFILE_GRID_LINES as f64;
        let x = values.min + f * values.span();
        let y = -depths.max + f * depths.span();
        chart.draw_series(std::iter::once(PathElement::new(vec![(x, -depths.max), (x, -depths.min)], grid)))?;
        chart.draw_series(std::iter::once(PathElement::new(vec![(values.min, y), (values.max, y)], grid)))?;
    }
    chart.draw_series(LineSeries::new(points.iter().map(|(v, d)| (*v, -*d)), &BLUE))?;
    root.present()?;
    Ok(())
}

pub fn profile_data_uri(profile: &DepthProfile, width: u32, height: u32) -> Result<String, ExportError> {
    let image = render_profile(profile, width, height)?;
    png_data_uri(&image)
}
