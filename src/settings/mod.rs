//! User settings: control panel placement, collapsing and diagram size.
//!
//! Settings live in a single TOML or JSON file. [`locate_settings`] finds it
//! (explicit path, then the working directory, then the platform config
//! directory) and [`SettingsFile`] writes it back after every change.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Point, Size};

pub mod layout;

pub const SETTINGS_FILE_NAME: &str = "diagram-zoom-drag.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML settings: {0}")]
    ParseToml(#[from] toml::de::Error),

    #[error("failed to parse JSON settings: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("failed to serialize settings to TOML: {0}")]
    SerializeToml(#[from] toml::ser::Error),

    #[error("failed to serialize settings to JSON: {0}")]
    SerializeJson(serde_json::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    Move,
    Zoom,
}

impl PanelKind {
    pub const ALL: [PanelKind; 2] = [PanelKind::Move, PanelKind::Zoom];

    pub fn name(self) -> &'static str {
        match self {
            PanelKind::Move => "move",
            PanelKind::Zoom => "zoom",
        }
    }
}

/// CSS-like placement of a panel inside its container. At most one of
/// `left`/`right` and one of `top`/`bottom` is expected to be set; values are
/// `"<n>px"` or `"<n>%"`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelPosition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<String>,
}

impl PanelPosition {
    pub fn right_bottom(right: &str, bottom: &str) -> Self {
        Self {
            right: Some(right.to_string()),
            bottom: Some(bottom.to_string()),
            ..Self::default()
        }
    }

    /// Top-left corner of a `panel` sized box placed in `container`.
    ///
    /// `left` wins over `right` and `top` over `bottom`; unparsable or
    /// missing values fall back to the container's top-left edge.
    pub fn resolve(&self, container: Size, panel: Size) -> Point {
        let x = match (&self.left, &self.right) {
            (Some(left), _) => parse_length(left, container.width),
            (None, Some(right)) => parse_length(right, container.width)
                .map(|r| container.width - panel.width - r),
            (None, None) => None,
        };
        let y = match (&self.top, &self.bottom) {
            (Some(top), _) => parse_length(top, container.height),
            (None, Some(bottom)) => parse_length(bottom, container.height)
                .map(|b| container.height - panel.height - b),
            (None, None) => None,
        };
        Point::new(x.unwrap_or(0.0), y.unwrap_or(0.0))
    }

    /// The set properties as inline style pairs.
    pub fn styles(&self) -> Vec<(&'static str, &str)> {
        [
            ("left", &self.left),
            ("right", &self.right),
            ("top", &self.top),
            ("bottom", &self.bottom),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

/// Parses `"12px"`, `"12"` or `"12.5%"` (of `total`).
fn parse_length(value: &str, total: f32) -> Option<f32> {
    let value = value.trim();
    if let Some(percent) = value.strip_suffix('%') {
        return percent.trim().parse::<f32>().ok().map(|p| p / 100.0 * total);
    }
    value
        .strip_suffix("px")
        .unwrap_or(value)
        .trim()
        .parse::<f32>()
        .ok()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub enabled: bool,
    pub position: PanelPosition,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            position: PanelPosition::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelsConfig {
    #[serde(rename = "move")]
    pub move_panel: PanelConfig,
    #[serde(rename = "zoom")]
    pub zoom_panel: PanelConfig,
}

impl Default for PanelsConfig {
    fn default() -> Self {
        Self {
            move_panel: PanelConfig {
                enabled: true,
                position: PanelPosition::right_bottom("10px", "10px"),
            },
            zoom_panel: PanelConfig {
                enabled: true,
                position: PanelPosition::right_bottom("120px", "10px"),
            },
        }
    }
}

impl PanelsConfig {
    pub fn get(&self, kind: PanelKind) -> &PanelConfig {
        match kind {
            PanelKind::Move => &self.move_panel,
            PanelKind::Zoom => &self.zoom_panel,
        }
    }

    pub fn get_mut(&mut self, kind: PanelKind) -> &mut PanelConfig {
        match kind {
            PanelKind::Move => &mut self.move_panel,
            PanelKind::Zoom => &mut self.zoom_panel,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PanelKind, &PanelConfig)> {
        PanelKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramSize {
    /// Height of an expanded container as a fraction of the viewport height.
    pub expanded_height: f32,
    /// Height of a folded container in pixels.
    pub folded_height: f32,
}

impl Default for DiagramSize {
    fn default() -> Self {
        Self {
            expanded_height: 0.7,
            folded_height: 50.0,
        }
    }
}

impl DiagramSize {
    pub fn expanded_css(&self) -> String {
        format!("{}vh", self.expanded_height * 100.0)
    }

    pub fn folded_css(&self) -> String {
        format!("{}px", self.folded_height)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub panels_config: PanelsConfig,
    pub collapse_by_default: bool,
    pub automatic_collapsing_on_focus_change: bool,
    pub diagram_size: DiagramSize,
    pub fit_max_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            panels_config: PanelsConfig::default(),
            collapse_by_default: false,
            automatic_collapsing_on_focus_change: false,
            diagram_size: DiagramSize::default(),
            fit_max_attempts: 60,
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Reads settings from `path`, trying the format its extension suggests
/// first and the other one second.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings, SettingsError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if is_json(path) {
        match serde_json::from_str::<Settings>(&content) {
            Ok(settings) => Ok(settings),
            Err(json_err) => toml::from_str::<Settings>(&content).map_err(|_| json_err.into()),
        }
    } else {
        match toml::from_str::<Settings>(&content) {
            Ok(settings) => Ok(settings),
            Err(toml_err) => serde_json::from_str::<Settings>(&content).map_err(|_| toml_err.into()),
        }
    }
}

pub fn save_settings(path: impl AsRef<Path>, settings: &Settings) -> Result<(), SettingsError> {
    let path = path.as_ref();
    let content = if is_json(path) {
        serde_json::to_string_pretty(settings).map_err(SettingsError::SerializeJson)?
    } else {
        toml::to_string_pretty(settings)?
    };
    fs::write(path, content).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Settings file path in the platform config directory, if there is one.
pub fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "diagram-zoom-drag", "diagram-zoom-drag")
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE_NAME))
}

/// Finds and loads the settings file.
///
/// Search order:
/// 1. Explicit path if provided (must exist)
/// 2. `diagram-zoom-drag.toml` in the working directory
/// 3. Platform-specific config directory
/// 4. Defaults, to be saved to the platform path (or the local one)
pub fn locate_settings(
    explicit_path: Option<&Path>,
) -> Result<(Settings, PathBuf), SettingsError> {
    if let Some(path) = explicit_path {
        info!(path = path.display().to_string(); "Loading settings from explicit path");
        return Ok((load_settings(path)?, path.to_path_buf()));
    }

    let local = PathBuf::from(SETTINGS_FILE_NAME);
    if local.exists() {
        info!(path = local.display().to_string(); "Loading settings from local path");
        return Ok((load_settings(&local)?, local));
    }

    let system = default_settings_path();
    match &system {
        Some(path) if path.exists() => {
            info!(path = path.display().to_string(); "Loading settings from system path");
            return Ok((load_settings(path)?, path.clone()));
        }
        Some(path) => {
            debug!(path = path.display().to_string(); "System settings file not found");
        }
        None => debug!("Could not determine platform-specific config directory"),
    }

    debug!("No settings file found, using default settings");
    Ok((Settings::default(), system.unwrap_or(local)))
}

/// Destination for settings changes.
pub trait SettingsSink {
    fn save(&mut self, settings: &Settings) -> Result<(), SettingsError>;
}

#[derive(Clone, Debug)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsSink for SettingsFile {
    fn save(&mut self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        save_settings(&self.path, settings)?;
        debug!(path = self.path.display().to_string(); "Saved settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_default_panel_positions() {
        let panels = PanelsConfig::default();
        assert_eq!(panels.move_panel.position.right.as_deref(), Some("10px"));
        assert_eq!(panels.zoom_panel.position.right.as_deref(), Some("120px"));
        assert!(panels.iter().all(|(_, p)| p.enabled));
    }

    #[test]
    fn test_resolve_right_bottom() {
        let pos = PanelPosition::right_bottom("10px", "10px");
        let p = pos.resolve(Size::new(400.0, 300.0), Size::new(60.0, 40.0));
        assert_approx_eq!(f32, p.x, 330.0);
        assert_approx_eq!(f32, p.y, 250.0);
    }

    #[test]
    fn test_resolve_percentages() {
        let pos = PanelPosition {
            left: Some("50.0%".to_string()),
            top: Some("25%".to_string()),
            ..PanelPosition::default()
        };
        let p = pos.resolve(Size::new(400.0, 300.0), Size::new(60.0, 40.0));
        assert_approx_eq!(f32, p.x, 200.0);
        assert_approx_eq!(f32, p.y, 75.0);
    }

    #[test]
    fn test_resolve_garbage_falls_back_to_origin() {
        let pos = PanelPosition {
            left: Some("calc(1px + 2px)".to_string()),
            ..PanelPosition::default()
        };
        assert_eq!(pos.resolve(Size::new(100.0, 100.0), Size::ZERO), Point::ZERO);
    }

    #[test]
    fn test_styles_lists_set_properties() {
        let pos = PanelPosition::right_bottom("0px", "5px");
        assert_eq!(pos.styles(), vec![("right", "0px"), ("bottom", "5px")]);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            collapse_by_default = true

            [panels_config.zoom]
            enabled = false
            "#,
        )
        .unwrap();
        assert!(settings.collapse_by_default);
        assert!(!settings.panels_config.zoom_panel.enabled);
        assert_eq!(settings.panels_config.move_panel, PanelsConfig::default().move_panel);
        assert_eq!(settings.fit_max_attempts, 60);
    }

    #[test]
    fn test_save_and_load_toml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.automatic_collapsing_on_focus_change = true;
        settings.panels_config.move_panel.position = PanelPosition {
            left: Some("0px".to_string()),
            top: Some("0px".to_string()),
            ..PanelPosition::default()
        };

        for name in ["settings.toml", "settings.json"] {
            let path = dir.path().join(name);
            save_settings(&path, &settings).unwrap();
            assert_eq!(load_settings(&path).unwrap(), settings);
        }
    }

    #[test]
    fn test_load_falls_back_to_other_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, r#"{"collapse_by_default": true}"#).unwrap();
        assert!(load_settings(&path).unwrap().collapse_by_default);
    }

    #[test]
    fn test_load_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "collapse_by_default = [").unwrap();
        assert!(matches!(load_settings(&path), Err(SettingsError::ParseToml(_))));
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            locate_settings(Some(&missing)),
            Err(SettingsError::Io { .. })
        ));
    }

    #[test]
    fn test_settings_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = SettingsFile::new(dir.path().join("nested/config/settings.toml"));
        sink.save(&Settings::default()).unwrap();
        assert_eq!(load_settings(sink.path()).unwrap(), Settings::default());
    }
}
