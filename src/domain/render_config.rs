// Presentation settings for each data source and the shared layout
use crate::domain::catalog::{BRUNE_MAGNITUDE, STAGE};
use crate::domain::colorscale::{Colorscale, Palette};
use crate::domain::error::ConfigError;
use crate::domain::time_series::TargetTime;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub min: f64,
    pub max: f64,
}

impl ColorRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// What to do when a signal and its coordinates disagree in length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthPolicy {
    /// Truncate longer signals, tile shorter ones.
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MsRenderConfig {
    pub colorscale: Colorscale,
    pub colorbar_range: Option<ColorRange>,
    pub color_by: String,
    pub size_by: String,
    /// Accepted for the size selector but not used by the size formula.
    pub size_range: Option<(f64, f64)>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
}

impl Default for MsRenderConfig {
    fn default() -> Self {
        Self {
            colorscale: Colorscale::new(Palette::Viridis, false),
            colorbar_range: None,
            color_by: STAGE.to_string(),
            size_by: BRUNE_MAGNITUDE.to_string(),
            size_range: None,
            start_time: None,
            end_time: None,
        }
    }
}

impl MsRenderConfig {
    pub fn set_colorscale(&mut self, name: &str) -> Result<(), ConfigError> {
        self.colorscale = name.parse()?;
        Ok(())
    }

    pub fn set_colorbar_range(&mut self, range: Option<ColorRange>) {
        self.colorbar_range = range;
    }

    pub fn set_colorby(&mut self, attribute: impl Into<String>) {
        self.color_by = attribute.into();
    }

    pub fn set_sizeby(&mut self, attribute: impl Into<String>) {
        self.size_by = attribute.into();
    }

    pub fn set_size_range(&mut self, range: Option<(f64, f64)>) {
        if range.is_some() {
            tracing::debug!("size range stored; marker sizes use the fixed magnitude multiplier");
        }
        self.size_range = range;
    }

    pub fn set_start_time(&mut self, start: Option<NaiveDateTime>) {
        self.start_time = start;
    }

    pub fn set_end_time(&mut self, end: Option<NaiveDateTime>) {
        self.end_time = end;
    }

    /// Active window with bounds ordered.
    pub fn window(&self) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
        match (self.start_time, self.end_time) {
            (Some(s), Some(e)) if e < s => (Some(e), Some(s)),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Downsample {
    pub time: usize,
    pub depth: usize,
}

/// Which sample of the fiber signal the 3D trace shows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum DasTimeSelection {
    /// All samples flattened onto the channel positions.
    #[default]
    Full,
    Index(usize),
    At(TargetTime),
    /// Track the end of the event time window.
    FollowEvents,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DasRenderConfig {
    pub colorscale: Colorscale,
    pub colorbar_range: Option<ColorRange>,
    pub downsample: Downsample,
    pub time: DasTimeSelection,
    pub marker_size: f64,
    pub length_policy: LengthPolicy,
}

impl Default for DasRenderConfig {
    fn default() -> Self {
        Self {
            colorscale: Colorscale::new(Palette::RdBu, true),
            colorbar_range: None,
            downsample: Downsample { time: 5, depth: 5 },
            time: DasTimeSelection::Full,
            marker_size: 3.0,
            length_policy: LengthPolicy::Lenient,
        }
    }
}

impl DasRenderConfig {
    pub fn set_colorscale(&mut self, name: &str) -> Result<(), ConfigError> {
        self.colorscale = name.parse()?;
        Ok(())
    }

    pub fn set_colorbar_range(&mut self, range: Option<ColorRange>) {
        self.colorbar_range = range;
    }

    pub fn set_downsample(&mut self, time: usize, depth: usize) -> Result<(), ConfigError> {
        if time == 0 || depth == 0 {
            return Err(ConfigError::InvalidDownsample { time, depth });
        }
        self.downsample = Downsample { time, depth };
        Ok(())
    }

    pub fn set_time(&mut self, time: DasTimeSelection) {
        self.time = time;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WellRenderConfig {
    pub colors: Vec<String>,
    pub line_width: f64,
}

impl Default for WellRenderConfig {
    fn default() -> Self {
        Self {
            colors: ["red", "blue", "green", "orange"].map(String::from).to_vec(),
            line_width: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectMode {
    Auto,
    Cube,
    Data,
    Manual,
}

impl AspectMode {
    pub const ALL: [AspectMode; 4] = [AspectMode::Auto, AspectMode::Cube, AspectMode::Data, AspectMode::Manual];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectMode::Auto => "auto",
            AspectMode::Cube => "cube",
            AspectMode::Data => "data",
            AspectMode::Manual => "manual",
        }
    }
}

impl FromStr for AspectMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| ConfigError::UnknownAspectMode(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// User-entered bounds; each side overrides the default on its own.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisOverride {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStyle {
    Interactive,
    Static,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub title: String,
    pub style: LayoutStyle,
    pub aspect_mode: AspectMode,
    pub aspect_ratio: Option<AspectRatio>,
    pub x: AxisOverride,
    pub y: AxisOverride,
    pub z: AxisOverride,
}

impl LayoutConfig {
    pub fn interactive(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            style: LayoutStyle::Interactive,
            aspect_mode: AspectMode::Manual,
            aspect_ratio: None,
            x: AxisOverride::default(),
            y: AxisOverride::default(),
            z: AxisOverride::default(),
        }
    }

    pub fn static_view() -> Self {
        Self {
            title: "Static 3D Viewer".to_string(),
            style: LayoutStyle::Static,
            aspect_mode: AspectMode::Data,
            ..Self::interactive("")
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_aspect_mode(&mut self, mode: &str) -> Result<(), ConfigError> {
        self.aspect_mode = mode.parse()?;
        Ok(())
    }

    /// Custom ratio; switches the mode to manual.
    pub fn set_aspect_ratio(&mut self, x: f64, y: f64, z: f64) {
        self.aspect_ratio = Some(AspectRatio { x, y, z });
        self.aspect_mode = AspectMode::Manual;
    }

    pub fn set_axis_range(&mut self, axis: Axis, min: Option<f64>, max: Option<f64>) {
        let bounds = AxisOverride { min, max };
        match axis {
            Axis::X => self.x = bounds,
            Axis::Y => self.y = bounds,
            Axis::Z => self.z = bounds,
        }
    }
}

/// Every source's settings, read together on each rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub ms: MsRenderConfig,
    pub das: DasRenderConfig,
    pub wells: WellRenderConfig,
    pub layout: LayoutConfig,
}

impl SceneConfig {
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            ms: MsRenderConfig::default(),
            das: DasRenderConfig::default(),
            wells: WellRenderConfig::default(),
            layout,
        }
    }
}
