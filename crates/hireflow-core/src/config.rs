use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HireflowError, Result};
use crate::types::Orientation;

/// Top-level hireflow configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub zoom: ZoomConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Orientation a freshly opened editor starts in.
    #[serde(default)]
    pub orientation: Orientation,
    /// Maximum number of retained history snapshots.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::default(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize { 50 }

/// Spacing constants of the auto-layout engine, in canvas units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// X of the first column (horizontal) or Y of the first row (vertical).
    #[serde(default = "default_origin")]
    pub origin: f64,
    /// Horizontal axis that columns are centered on.
    #[serde(default = "default_horizontal_axis_y")]
    pub horizontal_axis_y: f64,
    /// Vertical axis that rows are centered on.
    #[serde(default = "default_vertical_axis_x")]
    pub vertical_axis_x: f64,
    /// Spacing between things placed side by side.
    #[serde(default = "default_gap_x")]
    pub gap_x: f64,
    /// Spacing between things placed one above the other.
    #[serde(default = "default_gap_y")]
    pub gap_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            horizontal_axis_y: default_horizontal_axis_y(),
            vertical_axis_x: default_vertical_axis_x(),
            gap_x: default_gap_x(),
            gap_y: default_gap_y(),
        }
    }
}

fn default_origin() -> f64 { 50.0 }
fn default_horizontal_axis_y() -> f64 { 350.0 }
fn default_vertical_axis_x() -> f64 { 600.0 }
fn default_gap_x() -> f64 { 100.0 }
fn default_gap_y() -> f64 { 60.0 }

/// Zoom range shared by the wheel handler and the toolbar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomConfig {
    #[serde(default = "default_zoom_min")]
    pub min: f64,
    #[serde(default = "default_zoom_max")]
    pub max: f64,
    /// Toolbar zoom increment.
    #[serde(default = "default_zoom_step")]
    pub step: f64,
    /// Zoom change per wheel delta unit.
    #[serde(default = "default_wheel_sensitivity")]
    pub wheel_sensitivity: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: default_zoom_min(),
            max: default_zoom_max(),
            step: default_zoom_step(),
            wheel_sensitivity: default_wheel_sensitivity(),
        }
    }
}

fn default_zoom_min() -> f64 { 0.1 }
fn default_zoom_max() -> f64 { 3.0 }
fn default_zoom_step() -> f64 { 0.1 }
fn default_wheel_sensitivity() -> f64 { 0.001 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database holding saved workflows.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String { "~/.hireflow/workflows.db".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Page name announced when joining a room.
    #[serde(default = "default_presence_page")]
    pub page: String,
    /// Buffered events per room before slow subscribers start skipping.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            page: default_presence_page(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_presence_page() -> String { "workflow".to_string() }
fn default_channel_capacity() -> usize { 64 }

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| HireflowError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        let config: AppConfig =
            toml::from_str(&expanded).map_err(|e| HireflowError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Reject values the editor cannot work with.
    pub fn check(&self) -> Result<()> {
        if self.editor.history_limit == 0 {
            return Err(HireflowError::Config(
                "editor.history_limit must be at least 1".into(),
            ));
        }
        if !(self.zoom.min > 0.0 && self.zoom.min <= self.zoom.max) {
            return Err(HireflowError::Config(format!(
                "zoom range is empty: min {} max {}",
                self.zoom.min, self.zoom.max
            )));
        }
        Ok(())
    }

    /// Resolve the store path (expand ~).
    pub fn store_path(&self) -> PathBuf {
        let path = &self.store.path;
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs_home() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                // Keep original if env var not set
                Err(_) => result.push_str(&format!("${{{}}}", var_name)),
            }
        } else {
            result.push(c);
        }
    }
    result
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
