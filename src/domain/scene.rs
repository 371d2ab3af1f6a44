// Scene model - serializes to the figure JSON Plotly.js draws
use crate::domain::render_config::{AspectMode, AspectRatio};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub data: Vec<Trace>,
    pub layout: Layout,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<Frame>,
}

impl Scene {
    pub fn trace(&self, role: TraceRole) -> Option<&Trace> {
        self.data.iter().find(|t| t.role == role)
    }
}

/// Which source a trace came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceRole {
    Well,
    Events,
    Fiber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceMode {
    Markers,
    Lines,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub mode: TraceMode,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
    #[serde(skip)]
    pub role: TraceRole,
}

impl Trace {
    pub fn scatter3d(name: impl Into<String>, mode: TraceMode, role: TraceRole) -> Self {
        Self {
            kind: "scatter3d",
            name: name.into(),
            mode,
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            text: None,
            marker: None,
            line: None,
            role,
        }
    }

    pub fn colorbar_mut(&mut self) -> Option<&mut ColorBar> {
        self.marker.as_mut().and_then(|m| m.colorbar.as_mut())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarkerSize {
    Uniform(f64),
    PerPoint(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarkerColor {
    Uniform(String),
    Values(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub size: MarkerSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizemode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizeref: Option<f64>,
    pub color: MarkerColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<Vec<(f64, String)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorbar: Option<ColorBar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorBar {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xanchor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yanchor: Option<&'static str>,
}

impl ColorBar {
    pub fn titled(text: impl Into<String>) -> Self {
        Self {
            title: Title::new(text),
            x: None,
            y: None,
            xanchor: None,
            yanchor: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub width: u32,
    pub height: u32,
    pub scene: SceneLayout,
    pub legend: Legend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sliders: Vec<Slider>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub updatemenus: Vec<UpdateMenu>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneLayout {
    pub xaxis: AxisLayout,
    pub yaxis: AxisLayout,
    pub zaxis: AxisLayout,
    pub aspectmode: AspectMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspectratio: Option<AspectRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<Camera>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLayout {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
    pub autorange: AutoRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoRange {
    On,
    Off,
    Reversed,
}

impl Serialize for AutoRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AutoRange::On => serializer.serialize_bool(true),
            AutoRange::Off => serializer.serialize_bool(false),
            AutoRange::Reversed => serializer.serialize_str("reversed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub x: f64,
    pub y: f64,
    pub xanchor: &'static str,
    pub yanchor: &'static str,
    pub bordercolor: &'static str,
    pub borderwidth: u32,
    pub bgcolor: &'static str,
    pub font: Font,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub r: u32,
}

/// Named snapshot of the traces, played back by `animate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub name: String,
    pub data: Vec<Trace>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameTiming {
    pub duration: u32,
    pub redraw: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transition {
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationOptions {
    pub frame: FrameTiming,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fromcurrent: Option<bool>,
    pub mode: &'static str,
    pub transition: Transition,
}

/// `[frame names, options]`; `None` names play every frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimateArgs(pub Option<Vec<String>>, pub AnimationOptions);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pad {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliderStep {
    pub args: AnimateArgs,
    pub label: String,
    pub method: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentValue {
    pub font: Font,
    pub visible: bool,
    pub xanchor: &'static str,
    pub prefix: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slider {
    pub active: usize,
    pub currentvalue: CurrentValue,
    pub pad: Pad,
    pub steps: Vec<SliderStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuButton {
    pub args: AnimateArgs,
    pub label: &'static str,
    pub method: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateMenu {
    pub buttons: Vec<MenuButton>,
    pub direction: &'static str,
    pub pad: Pad,
    pub showactive: bool,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub x: f64,
    pub xanchor: &'static str,
    pub y: f64,
    pub yanchor: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Camera as reported by Plotly's `scene.camera` relayout data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub eye: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<CameraProjection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraProjection {
    #[serde(rename = "type")]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trace_serializes_plotly_fields_only() {
        let mut trace = Trace::scatter3d("A Well", TraceMode::Lines, TraceRole::Well);
        trace.x = vec![1.0];
        trace.y = vec![2.0];
        trace.z = vec![3.0];
        trace.line = Some(LineStyle {
            color: Some("red".to_string()),
            width: 3.0,
        });
        let value = serde_json::to_value(&trace).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "scatter3d",
                "name": "A Well",
                "mode": "lines",
                "x": [1.0], "y": [2.0], "z": [3.0],
                "line": {"color": "red", "width": 3.0}
            })
        );
    }

    #[test]
    fn test_autorange_serialization() {
        assert_eq!(serde_json::to_value(AutoRange::Reversed).unwrap(), json!("reversed"));
        assert_eq!(serde_json::to_value(AutoRange::Off).unwrap(), json!(false));
    }

    #[test]
    fn test_camera_accepts_plotly_relayout_payload() {
        let camera: Camera = serde_json::from_value(json!({
            "up": {"x": 0, "y": 0, "z": 1},
            "center": {"x": 0, "y": 0, "z": 0},
            "eye": {"x": 1.25, "y": 1.25, "z": 1.25},
            "projection": {"type": "perspective"}
        }))
        .unwrap();
        assert_eq!(camera.eye, Vec3 { x: 1.25, y: 1.25, z: 1.25 });
        assert_eq!(camera.projection.unwrap().kind, "perspective");
    }
}
