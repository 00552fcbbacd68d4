use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::processing::segmentation::SegmentationParams;

/// Environment variable that overrides the configured service credential.
pub const API_KEY_ENV: &str = "REMOVE_BG_API_KEY";

#[derive(Debug, Default, Serialize, Deserialize)]
/// Persisted settings for photosheet.
pub struct AppConfig {
    pub remove_bg_api_key: Option<String>,
    pub color_threshold: Option<f32>,
    pub edge_threshold: Option<f32>,
    pub jpg_quality: Option<u8>,
}

impl AppConfig {
    /// Returns the user config file path, if a config directory is available.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("photosheet").join("config.toml"))
    }

    /// Loads config from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        toml::from_str(&contents).unwrap_or_default()
    }

    /// Writes config to disk, ignoring filesystem/serialization errors.
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(s) = toml::to_string_pretty(self) {
            let _ = std::fs::write(&path, s);
        }
    }

    /// Service credential: environment first, then the config file.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .or_else(|| self.remove_bg_api_key.clone())
    }

    /// Segmentation thresholds with config overrides applied.
    pub fn segmentation_params(&self) -> SegmentationParams {
        let defaults = SegmentationParams::default();
        SegmentationParams {
            color_threshold: self.color_threshold.unwrap_or(defaults.color_threshold),
            edge_threshold: self.edge_threshold.unwrap_or(defaults.edge_threshold),
        }
    }
}
