//! Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StepclipError, StepclipResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Transport defaults applied when a controller is bound.
    #[serde(default)]
    pub playback: PlaybackDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default transport parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackDefaults {
    /// Initial playback rate (absolute value is used).
    pub rate: f64,

    /// Whether playback loops at the end of the play range.
    pub looping: bool,

    /// Optional mean step duration (ms) used to calibrate the time stretch.
    #[serde(default)]
    pub frame_duration_ms: Option<f64>,

    /// Tick rate used when simulating playback (Hz).
    pub tick_hz: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "stepclip=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self {
            rate: 1.0,
            looping: false,
            frame_duration_ms: None,
            tick_hz: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> StepclipResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Reject values no controller could honor.
    pub fn validate(&self) -> StepclipResult<()> {
        let playback = &self.playback;
        if !playback.rate.is_finite() || playback.rate == 0.0 {
            return Err(StepclipError::config(format!(
                "playback.rate must be finite and non-zero, got {}",
                playback.rate
            )));
        }
        if let Some(ms) = playback.frame_duration_ms {
            if !ms.is_finite() || ms <= 0.0 {
                return Err(StepclipError::config(format!(
                    "playback.frame_duration_ms must be positive, got {ms}"
                )));
            }
        }
        if playback.tick_hz == 0 {
            return Err(StepclipError::config("playback.tick_hz must be >= 1"));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("stepclip").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.playback.rate, 1.0);
        assert!(!config.playback.looping);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let mut config = AppConfig::default();
        config.playback.rate = 0.0;
        assert!(matches!(
            config.validate(),
            Err(StepclipError::Config { .. })
        ));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("stepclip_test_config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.json");

        let mut config = AppConfig::default();
        config.playback.looping = true;
        config.playback.frame_duration_ms = Some(40.0);
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_from_reports_invalid_json() {
        let dir = std::env::temp_dir().join("stepclip_test_config_invalid");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            AppConfig::load_from(&path),
            Err(StepclipError::Json(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
