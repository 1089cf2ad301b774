//! Controller and demo configuration.
//!
//! The controller itself needs very little: a name for its worker thread,
//! the session preset, and whether a media services reset may restart a
//! running session. The demo section drives the bundled binary.

use super::SessionPreset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a session controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Name of the serial worker thread.
    pub queue_label: String,
    /// Preset applied inside the configuration bracket.
    pub preset: SessionPreset,
    /// Restart a running session after a media services reset.
    pub auto_restart_on_media_reset: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            queue_label: "doc-camera-session".to_string(),
            preset: SessionPreset::Photo,
            auto_restart_on_media_reset: true,
        }
    }
}

impl ControllerConfig {
    /// Creates a configuration with a custom worker thread name.
    pub fn with_queue_label(label: impl Into<String>) -> Self {
        Self {
            queue_label: label.into(),
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_label.trim().is_empty() || self.queue_label.contains('\0') {
            return Err(ConfigError::InvalidQueueLabel);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("queue label must be non-empty and free of NUL bytes")]
    InvalidQueueLabel,
    #[error("invalid photo dimensions")]
    InvalidPhotoSize,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Settings for the demo binary's simulated camera and capture loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Captures to take when not running continuously.
    pub captures: u32,
    /// Delay between captures in milliseconds.
    pub capture_interval_ms: u64,
    /// Keep capturing until interrupted.
    pub continuous: bool,
    /// Answer the permission check with a grant.
    pub grant_permission: bool,
    /// Advertise a back camera.
    pub device_available: bool,
    /// Width of the synthetic photo.
    pub photo_width: u32,
    /// Height of the synthetic photo.
    pub photo_height: u32,
    /// Directory decoded photos are written to, as PNG.
    pub output_dir: Option<PathBuf>,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            captures: 3,
            capture_interval_ms: 250,
            continuous: false,
            grant_permission: true,
            device_available: true,
            photo_width: 640,
            photo_height: 480,
            output_dir: None,
            metrics_port: 0,
        }
    }
}

impl DemoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.photo_width == 0 || self.photo_height == 0 {
            return Err(ConfigError::InvalidPhotoSize);
        }
        Ok(())
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.controller.validate()?;
        config.demo.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(ControllerConfig::default().validate().is_ok());
        assert!(DemoConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_queue_label_invalid() {
        let config = ControllerConfig::with_queue_label("  ");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidQueueLabel)
        ));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = FileConfig::from_toml(
            r#"
            [controller]
            preset = "high"

            [demo]
            captures = 5
            grant_permission = false
            "#,
        )
        .unwrap();

        assert_eq!(config.controller.preset, SessionPreset::High);
        assert!(config.controller.auto_restart_on_media_reset);
        assert_eq!(config.demo.captures, 5);
        assert!(!config.demo.grant_permission);
        assert_eq!(config.demo.photo_width, 640);
    }

    #[test]
    fn test_zero_photo_size_rejected() {
        let result = FileConfig::from_toml("[demo]\nphoto_width = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidPhotoSize)));
    }

    #[test]
    fn test_malformed_file_rejected() {
        let result = FileConfig::from_toml("[controller\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
