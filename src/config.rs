//! Capture configuration, loaded from an optional TOML file.
//!
//! ```toml
//! device = 0
//!
//! [capture]
//! width = 640
//! height = 480
//! buffer_count = 4
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Device id to open.
    #[serde(default)]
    pub device: i32,
    /// Stream settings handed to the V4L2 backend.
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Stream settings for the V4L2 backend.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Requested frame width in pixels.
    pub width: u32,
    /// Requested frame height in pixels.
    pub height: u32,
    /// Number of mmap buffers queued with the driver.
    pub buffer_count: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            buffer_count: 4,
        }
    }
}

impl CaptureConfig {
    /// Reject settings no driver can satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.buffer_count == 0 {
            return Err(ConfigError::Invalid(
                "buffer_count must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|source| ConfigError::Parse { path: None, source })?;
        config.capture.validate()?;
        Ok(config)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("Failed to parse config{}: {source}", path_suffix(.path.as_ref()))]
    Parse {
        /// File that failed, if loaded from disk.
        path: Option<PathBuf>,
        /// Underlying error.
        source: toml::de::Error,
    },
    /// The values are out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

fn path_suffix(path: Option<&PathBuf>) -> String {
    path.map(|p| format!(" {}", p.display()))
        .unwrap_or_default()
}
