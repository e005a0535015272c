/*!
 * Configuration types for envsim
 */

use crate::directory::SensorRecord;
use crate::error::{Result, SimError};
use envsim_core_sim::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the simulator service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Consecutive publish failures after which a sensor is stopped
    #[serde(default = "default_error_threshold")]
    pub error_threshold: u32,

    /// Period of the bus reachability check
    #[serde(default = "default_health_check_interval_secs")]
    pub health_check_interval_secs: u64,

    /// Logging level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,

    /// Generator probabilities
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Where to fetch the fleet on startup
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Static fleet, used when no directory URL is configured
    #[serde(default)]
    pub sensors: Vec<SensorRecord>,
}

/// Sensor directory endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Listing URL; None disables HTTP restoration
    #[serde(default)]
    pub url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_directory_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_directory_timeout_secs(),
        }
    }
}

impl DirectoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            error_threshold: default_error_threshold(),
            health_check_interval_secs: default_health_check_interval_secs(),
            log_level: LogLevel::Info,
            log_file: None,
            verbose: false,
            generator: GeneratorConfig::default(),
            directory: DirectoryConfig::default(),
            sensors: Vec::new(),
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_error_threshold() -> u32 {
    3
}

fn default_health_check_interval_secs() -> u64 {
    30
}

fn default_directory_timeout_secs() -> u64 {
    10
}

impl SimulatorConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SimError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: SimulatorConfig = toml::from_str(&contents)?;
        config.validate().map_err(SimError::Config)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| SimError::Serialization(format!("TOML error: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.error_threshold == 0 {
            return Err("error_threshold must be at least 1".to_string());
        }

        if self.health_check_interval_secs == 0 {
            return Err("health_check_interval_secs must be greater than 0".to_string());
        }

        if self.directory.timeout_secs == 0 {
            return Err("directory.timeout_secs must be greater than 0".to_string());
        }

        self.generator.validate()?;

        for record in &self.sensors {
            if record.parsed_type().is_err() {
                return Err(format!(
                    "sensor {} has unknown type {}",
                    record.id, record.sensor_type
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = SimulatorConfig::default();
        assert_eq!(config.error_threshold, 3);
        assert_eq!(config.health_check_interval(), Duration::from_secs(30));
        assert_eq!(config.directory.timeout(), Duration::from_secs(10));
        assert!(config.directory.url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
            error_threshold = 5
            log_level = "debug"

            [generator]
            event_probability = 0.1

            [directory]
            url = "http://localhost:8080/api/sensors/active"
        "#;
        let config: SimulatorConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.error_threshold, 5);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.health_check_interval_secs, 30);
        assert_eq!(config.generator.event_probability, 0.1);
        assert_eq!(config.generator.regime_shift_probability, 0.02);
        assert_eq!(config.directory.timeout_secs, 10);
    }

    #[test]
    fn test_static_sensors_in_toml() {
        let toml_str = r#"
            [[sensors]]
            id = 1
            sensorId = "lab"
            type = "TEMPERATURE"
            userId = "U1"
            active = true
        "#;
        let config: SimulatorConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.sensors.len(), 1);
        assert_eq!(config.sensors[0].sensor_id, "lab");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = SimulatorConfig {
            error_threshold: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulatorConfig {
            health_check_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = SimulatorConfig::default();
        config.generator.event_probability = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let config = SimulatorConfig {
            error_threshold: 4,
            verbose: true,
            ..Default::default()
        };
        config.to_file(file.path()).unwrap();

        let loaded = SimulatorConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded.error_threshold, 4);
        assert!(loaded.verbose);
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Debug.to_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
