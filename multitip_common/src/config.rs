//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load the TOML configuration
//! used by the multitip binary and its tests.
//!
//! # Usage
//!
//! ```rust,no_run
//! use multitip_common::config::{ConfigLoader, ConfigError, MultitipConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = MultitipConfig::load(Path::new("multitip.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::consts::{DEFAULT_NUM_TIPS, HEAD_CHANNELS};
use crate::pipette::labware::Labware;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "multitip-bench-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: "multitip".to_string(),
        }
    }
}

fn default_pipette_name() -> String {
    "p50_multi".to_string()
}

fn default_channels() -> u8 {
    HEAD_CHANNELS
}

fn default_driver() -> String {
    "simulation".to_string()
}

fn default_max_volume_ul() -> f64 {
    50.0
}

fn default_num_tips() -> u8 {
    DEFAULT_NUM_TIPS
}

fn default_tip_racks() -> Vec<Labware> {
    vec![Labware::default()]
}

/// `[pipette]` section: the instrument and the tip racks it draws from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipetteConfig {
    /// Instrument name used in logs.
    #[serde(default = "default_pipette_name")]
    pub name: String,

    /// Channel count reported by the instrument.
    #[serde(default = "default_channels")]
    pub channels: u8,

    /// Largest volume one channel can hold, in microlitres.
    #[serde(default = "default_max_volume_ul")]
    pub max_volume_ul: f64,

    /// Registered driver to load (e.g. "simulation").
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Tips picked up when a call does not give a count.
    #[serde(default = "default_num_tips")]
    pub default_num_tips: u8,

    /// Where to keep the consumed-slot set between runs.
    #[serde(default)]
    pub state_file: Option<PathBuf>,

    /// Tip racks attached to the instrument.
    #[serde(default = "default_tip_racks")]
    pub tip_racks: Vec<Labware>,
}

impl PipetteConfig {
    /// Validate the pipette section.
    ///
    /// # Validation Rules
    /// 1. `channels` > 0
    /// 2. `max_volume_ul` > 0
    /// 3. every tip rack is valid
    /// 4. `default_num_tips` fits both the head and the first tip rack's rows
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels == 0 {
            return Err(ConfigError::ValidationError(
                "channels must be greater than 0".to_string(),
            ));
        }

        if self.max_volume_ul.is_nan() || self.max_volume_ul <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "max_volume_ul must be positive (got {})",
                self.max_volume_ul
            )));
        }

        for rack in &self.tip_racks {
            rack.validate()
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        }

        let capacity = self
            .tip_racks
            .first()
            .map_or(HEAD_CHANNELS, |rack| rack.dimensions.rows.min(HEAD_CHANNELS));
        if self.default_num_tips == 0 || self.default_num_tips > capacity {
            return Err(ConfigError::ValidationError(format!(
                "default_num_tips must be within 1..={} (got {})",
                capacity, self.default_num_tips
            )));
        }
        Ok(())
    }
}

impl Default for PipetteConfig {
    fn default() -> Self {
        Self {
            name: default_pipette_name(),
            channels: default_channels(),
            max_volume_ul: default_max_volume_ul(),
            driver: default_driver(),
            default_num_tips: default_num_tips(),
            state_file: None,
            tip_racks: default_tip_racks(),
        }
    }
}

/// Top-level configuration loaded from `multitip.toml`.
///
/// Every section is optional; omitted sections take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultitipConfig {
    /// Shared fields.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Instrument and tip racks.
    #[serde(default)]
    pub pipette: PipetteConfig,
}

impl MultitipConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.pipette.validate()
    }

    /// Resolve a relative `state_file` against the directory of the config file.
    pub fn state_file_in(&self, config_dir: &Path) -> Option<PathBuf> {
        self.pipette.state_file.as_ref().map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                config_dir.join(path)
            }
        })
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation: any serde-deserializable struct can be loaded.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        for (text, level) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let parsed: TestWrapper = toml::from_str(&format!("level = \"{text}\"")).unwrap();
            assert_eq!(parsed.level, level);
        }
    }

    #[test]
    fn test_log_level_into_tracing() {
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
        assert_eq!(tracing::Level::from(LogLevel::Trace), tracing::Level::TRACE);
    }

    #[test]
    fn test_shared_config_validation_empty_service_name() {
        let config = SharedConfig {
            log_level: LogLevel::Info,
            service_name: "".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = MultitipConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipette.channels, 8);
        assert_eq!(config.pipette.default_num_tips, 8);
        assert_eq!(config.pipette.tip_racks.len(), 1);
    }

    #[test]
    fn test_default_num_tips_out_of_range() {
        let mut config = MultitipConfig::default();
        config.pipette.default_num_tips = 9;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        config.pipette.default_num_tips = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_num_tips_bounded_by_head_on_tall_rack() {
        use crate::rack::RackDimensions;

        let mut config = MultitipConfig::default();
        config.pipette.tip_racks =
            vec![Labware::default().with_dimensions(RackDimensions::new(12, 12))];
        config.pipette.default_num_tips = 10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        config.pipette.default_num_tips = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_channels_rejected() {
        let mut config = MultitipConfig::default();
        config.pipette.channels = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_state_file_resolution() {
        let mut config = MultitipConfig::default();
        assert_eq!(config.state_file_in(Path::new("/etc/multitip")), None);

        config.pipette.state_file = Some(PathBuf::from("rack.bin"));
        assert_eq!(
            config.state_file_in(Path::new("/etc/multitip")),
            Some(PathBuf::from("/etc/multitip/rack.bin"))
        );

        config.pipette.state_file = Some(PathBuf::from("/var/lib/rack.bin"));
        assert_eq!(
            config.state_file_in(Path::new("/etc/multitip")),
            Some(PathBuf::from("/var/lib/rack.bin"))
        );
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = MultitipConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
