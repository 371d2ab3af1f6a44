use crate::domain::error::ConfigError;
use crate::domain::render_config::{LayoutConfig, SceneConfig};
use crate::infrastructure::projection::ProjectionParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ViewerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub reference: ReferenceSettings,
    #[serde(default)]
    pub display: DisplaySettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8050,
        }
    }
}

/// Input files; a missing entry leaves that source out.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DataSettings {
    pub catalog: Option<PathBuf>,
    /// Single CSV or a directory of per-well CSVs
    pub wells: Option<PathBuf>,
    pub fiber: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReferenceSettings {
    pub lat: f64,
    pub lon: f64,
    pub projection: ProjectionParams,
    pub invert_depth: bool,
    pub fiber_well: Option<String>,
}

impl Default for ReferenceSettings {
    fn default() -> Self {
        Self {
            lat: 31.97706,
            lon: -103.70791,
            projection: ProjectionParams::default(),
            invert_depth: true,
            fiber_well: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplaySettings {
    pub title: String,
    pub color_by: Option<String>,
    pub size_by: Option<String>,
    pub events_colorscale: Option<String>,
    pub fiber_colorscale: Option<String>,
    pub static_title: Option<String>,
    pub static_aspect_mode: Option<String>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            title: "3D Microseismic, DAS and Well Viewer".to_string(),
            color_by: None,
            size_by: None,
            events_colorscale: None,
            fiber_colorscale: None,
            static_title: None,
            static_aspect_mode: None,
        }
    }
}

impl DisplaySettings {
    /// Initial interactive settings
    pub fn scene_config(&self) -> Result<SceneConfig, ConfigError> {
        let mut config = SceneConfig::new(LayoutConfig::interactive(self.title.clone()));
        if let Some(attribute) = &self.color_by {
            config.ms.set_colorby(attribute.as_str());
        }
        if let Some(attribute) = &self.size_by {
            config.ms.set_sizeby(attribute.as_str());
        }
        if let Some(name) = &self.events_colorscale {
            config.ms.set_colorscale(name)?;
        }
        if let Some(name) = &self.fiber_colorscale {
            config.das.set_colorscale(name)?;
        }
        Ok(config)
    }

    pub fn static_layout(&self) -> Result<LayoutConfig, ConfigError> {
        let mut layout = LayoutConfig::static_view();
        if let Some(title) = &self.static_title {
            layout.set_title(title.as_str());
        }
        if let Some(mode) = &self.static_aspect_mode {
            layout.set_aspect_mode(mode)?;
        }
        Ok(layout)
    }
}

/// `config/viewer.{toml,...}` when present, then `VIEWER__SECTION__KEY` overrides
pub fn load_viewer_config() -> anyhow::Result<ViewerConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/viewer").required(false))
        .add_source(config::Environment::with_prefix("VIEWER").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_viewer_config_from(path: &Path) -> anyhow::Result<ViewerConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::render_config::AspectMode;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = ViewerConfig::default();
        assert_eq!(config.server.port, 8050);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.reference.invert_depth);
        assert!(config.data.catalog.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9000

[data]
catalog = "data/events.csv"

[reference]
fiber_well = "Well-2"

[display]
color_by = "Brune Magnitude"
static_aspect_mode = "cube"
"#
        )
        .unwrap();

        let config = load_viewer_config_from(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.data.catalog, Some(PathBuf::from("data/events.csv")));
        assert_eq!(config.reference.fiber_well.as_deref(), Some("Well-2"));
        assert_eq!(config.reference.lat, 31.97706);

        let scene = config.display.scene_config().unwrap();
        assert_eq!(scene.ms.color_by, "Brune Magnitude");
        assert_eq!(config.display.static_layout().unwrap().aspect_mode, AspectMode::Cube);
    }

    #[test]
    fn test_bad_colorscale_is_rejected() {
        let display = DisplaySettings {
            fiber_colorscale: Some("rainbow".to_string()),
            ..DisplaySettings::default()
        };
        assert_eq!(
            display.scene_config().unwrap_err(),
            ConfigError::UnknownColorscale("rainbow".to_string())
        );
    }
}
