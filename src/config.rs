// src/config.rs - Application configuration
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::projection::DEFAULT_CAMERA_DISTANCE;
use crate::smoothing::{DEFAULT_CAPACITY, DEFAULT_HAND_SLOTS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Samples averaged per joint
    pub smoothing_capacity: usize,
    /// Hands that get their own smoothing history
    pub hand_slots: usize,
    pub camera_distance: f64,
    pub window_size: [f32; 2],
    /// JSON style overrides, see `style::StyleConfig`
    pub style_path: Option<PathBuf>,
    /// Model the overlay moves onto the wrist
    pub model_path: Option<PathBuf>,
    pub output_directory: PathBuf,
    pub simulated_hands: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            smoothing_capacity: DEFAULT_CAPACITY,
            hand_slots: DEFAULT_HAND_SLOTS,
            camera_distance: DEFAULT_CAMERA_DISTANCE,
            window_size: [1280.0, 800.0],
            style_path: None,
            model_path: None,
            output_directory: directories::UserDirs::new()
                .and_then(|dirs| dirs.document_dir().map(|p| p.join("HandOverlay")))
                .unwrap_or_else(|| PathBuf::from("./output")),
            simulated_hands: 1,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "handoverlay", "HandOverlay")
            .map(|dirs| dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the user config, falling back to defaults when it is unusable.
    pub fn load_or_default() -> Self {
        let path = Self::config_path();
        match Self::load_from(&path) {
            Ok(config) => {
                info!("Using config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.smoothing_capacity == 0 {
            return Err(ConfigError::Invalid("smoothing_capacity must be at least 1".into()));
        }
        if self.hand_slots == 0 {
            return Err(ConfigError::Invalid("hand_slots must be at least 1".into()));
        }
        if !self.camera_distance.is_finite() {
            return Err(ConfigError::Invalid("camera_distance must be finite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("hand_overlay_cfg_{}", uuid::Uuid::new_v4()))
            .join("config.json")
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = AppConfig::load_from(&temp_path()).unwrap();
        assert_eq!(config.smoothing_capacity, 5);
        assert_eq!(config.hand_slots, 2);
        assert_eq!(config.camera_distance, 5.0);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{ "smoothing_capacity": 8 }"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.smoothing_capacity, 8);
        assert_eq!(config.simulated_hands, 1);
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path();
        let mut config = AppConfig::default();
        config.model_path = Some(PathBuf::from("bangle.glb"));
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.model_path, Some(PathBuf::from("bangle.glb")));
    }

    #[test]
    fn test_zero_hand_slots_rejected() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{ "hand_slots": 0 }"#).unwrap();

        assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{ "smoothing_capacity": 0 }"#).unwrap();

        assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::Invalid(_))));
    }
}
