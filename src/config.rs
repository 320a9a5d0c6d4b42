//! Configuration for the ECG monitor and simulator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application name used for config and data directories.
const APP_DIR: &str = "ecg-monitor";

/// Main configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for the monitoring client
    pub monitor: MonitorConfig,
    /// Settings for the reading simulator
    pub simulator: SimulatorConfig,
}

/// Monitoring client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Simulator address (`host:port` or a full `ws://` URL)
    pub server_addr: String,

    /// Directory for session logs
    pub log_dir: PathBuf,

    /// Play sounds for alerts
    pub beep: bool,

    /// Write normal readings to the session log
    pub log_normal: bool,

    /// Verbose diagnostics instead of the progress legend
    pub debug: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            server_addr: "localhost:8080".to_string(),
            log_dir: data_dir.join("logs"),
            beep: true,
            log_normal: true,
            debug: false,
        }
    }
}

/// Reading simulator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Address to listen on
    pub listen_addr: String,

    /// Time between readings on each connection
    #[serde(with = "duration_millis")]
    pub send_interval: Duration,

    /// Inject tachycardic/bradycardic/irregular beats
    pub simulate_irregular: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            send_interval: Duration::from_secs(1),
            simulate_irregular: true,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration JSON; missing fields take their defaults.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.json")
    }
}

/// Parse an interval such as `500ms`, `1s`, `2m`, or a bare number of seconds.
pub fn parse_interval(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();
    let invalid = || ConfigError::InvalidInterval(s.to_string());

    let (number, unit_ms) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1.0)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000.0)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000.0)
    } else {
        (s, 1_000.0)
    };

    let value: f64 = number.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid());
    }

    let millis = (value * unit_ms).round() as u64;
    if millis == 0 {
        return Err(invalid());
    }
    Ok(Duration::from_millis(millis))
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidInterval(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidInterval(s) => {
                write!(f, "Invalid interval '{s}' (expected e.g. 500ms, 1s, 2m)")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        if millis == 0 {
            return Err(serde::de::Error::custom("interval must be at least 1 ms"));
        }
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.monitor.server_addr, "localhost:8080");
        assert!(config.monitor.beep);
        assert!(config.monitor.log_normal);
        assert!(!config.monitor.debug);
        assert!(config.monitor.log_dir.ends_with("logs"));
        assert_eq!(config.simulator.send_interval, Duration::from_secs(1));
        assert!(config.simulator.simulate_irregular);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config =
            Config::from_json(r#"{"simulator": {"send_interval": 250}, "monitor": {"beep": false}}"#)
                .unwrap();

        assert_eq!(config.simulator.send_interval, Duration::from_millis(250));
        assert_eq!(config.simulator.listen_addr, "0.0.0.0:8080");
        assert!(!config.monitor.beep);
        assert!(config.monitor.log_normal);
    }

    #[test]
    fn test_invalid_config_json() {
        assert!(matches!(
            Config::from_json("{not json"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = Config::from_json(r#"{"simulator": {"send_interval": 0}}"#);
        match result {
            Err(ConfigError::ParseError(e)) => assert!(e.contains("at least 1 ms"), "{e}"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_interval("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_interval("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_interval("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_interval("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn test_parse_interval_rejects_bad_input() {
        for bad in ["", "fast", "0s", "-1s", "0.0001ms"] {
            assert!(parse_interval(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
