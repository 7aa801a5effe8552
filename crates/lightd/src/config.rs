//! Configuration file parsing and structures.
//!
//! lightd uses TOML for declarative configuration. Every integration has a
//! statically typed section under `[integrations]`.

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;

/// Top-level configuration structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub integrations: IntegrationsConfig,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,

    /// Per-target levels, e.g. `"lightd::integrations::rest" = "debug"`
    #[serde(default)]
    pub overrides: HashMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Build a tracing filter from the default level and overrides
    pub fn targets(&self) -> Targets {
        Targets::new()
            .with_default(LevelFilter::from(self.level))
            .with_targets(
                self.overrides
                    .iter()
                    .map(|(target, level)| (target.clone(), LevelFilter::from(*level))),
            )
    }
}

fn default_api_enabled() -> bool {
    true
}

fn default_api_listen() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8565
}

/// HTTP API configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,

    #[serde(default = "default_api_listen")]
    pub listen: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: default_api_enabled(),
            listen: default_api_listen(),
            port: default_api_port(),
        }
    }
}

fn default_poll_interval() -> NonZeroU64 {
    NonZeroU64::new(30).unwrap_or(NonZeroU64::MIN)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Seconds between state refreshes of every light
    #[serde(default = "default_poll_interval")]
    pub poll_interval: NonZeroU64,
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval.get())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
        }
    }
}

/// Integration configuration container
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntegrationsConfig {
    /// MagicLight Bluetooth bulbs
    #[serde(default)]
    pub magiclight_ble: Option<MagicLightBleConfig>,

    /// RESTful lights, one platform per entry
    #[serde(default)]
    pub rest: Vec<RestLightConfig>,
}

/// MagicLight BLE platform configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MagicLightBleConfig {
    /// Key = bulb MAC address
    #[serde(default)]
    pub devices: HashMap<String, MagicLightDeviceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MagicLightDeviceConfig {
    pub id: String,
    pub name: String,
}

fn default_rest_name() -> String {
    "REST Light".to_string()
}

fn default_rest_timeout() -> NonZeroU64 {
    NonZeroU64::new(10).unwrap_or(NonZeroU64::MIN)
}

fn default_body_on() -> String {
    "ON".to_string()
}

fn default_body_off() -> String {
    "OFF".to_string()
}

/// RESTful light configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestLightConfig {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default = "default_rest_name")]
    pub name: String,

    /// Resource URL, e.g. "http://192.168.1.50/light"
    pub resource: String,

    /// Request timeout in seconds
    #[serde(default = "default_rest_timeout")]
    pub timeout: NonZeroU64,

    /// Accepted for compatibility with existing configs; not rendered
    #[serde(default = "default_body_on")]
    pub body_on: String,

    #[serde(default = "default_body_off")]
    pub body_off: String,

    #[serde(default)]
    pub is_on_template: Option<String>,
}

impl RestLightConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.get())
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        Self::parse(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(ConfigError::Parse)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.api.enabled);
        assert_eq!(config.api.listen, "127.0.0.1");
        assert_eq!(config.api.port, 8565);
        assert_eq!(config.engine.poll_interval(), Duration::from_secs(30));
        assert!(config.integrations.magiclight_ble.is_none());
        assert!(config.integrations.rest.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [logging]
            level = "warning"

            [logging.overrides]
            "lightd::integrations::rest" = "debug"

            [api]
            enabled = false
            port = 9000

            [engine]
            poll_interval = 5

            [integrations.magiclight_ble.devices."C4:BE:84:12:34:56"]
            id = "bedroom"
            name = "Bedroom Lamp"

            [[integrations.rest]]
            id = "desk"
            name = "Desk Strip"
            resource = "http://192.168.1.50/light"
            timeout = 3

            [[integrations.rest]]
            resource = "http://192.168.1.51/light"
        "#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(
            config.logging.overrides.get("lightd::integrations::rest"),
            Some(&LogLevel::Debug)
        );
        assert!(!config.api.enabled);
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.engine.poll_interval(), Duration::from_secs(5));

        let ble = config.integrations.magiclight_ble.as_ref().unwrap();
        let bedroom = ble.devices.get("C4:BE:84:12:34:56").unwrap();
        assert_eq!(bedroom.id, "bedroom");
        assert_eq!(bedroom.name, "Bedroom Lamp");

        let rest = &config.integrations.rest;
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].id.as_deref(), Some("desk"));
        assert_eq!(rest[0].timeout(), Duration::from_secs(3));
        assert_eq!(rest[1].id, None);
        assert_eq!(rest[1].name, "REST Light");
        assert_eq!(rest[1].timeout(), Duration::from_secs(10));
        assert_eq!(rest[1].body_on, "ON");
        assert_eq!(rest[1].body_off, "OFF");
    }

    #[test]
    fn test_rest_requires_resource() {
        let toml = r#"
            [[integrations.rest]]
            name = "Nowhere"
        "#;
        assert!(matches!(Config::parse(toml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_rest_rejects_zero_timeout() {
        let toml = r#"
            [[integrations.rest]]
            resource = "http://localhost/light"
            timeout = 0
        "#;
        assert!(Config::parse(toml).is_err());
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let toml = r#"
            [integrations.magiclight_ble.devices."C4:BE:84:12:34:56"]
            id = "bedroom"
            name = "Bedroom Lamp"
            effect = "random"
        "#;
        assert!(Config::parse(toml).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("lightd.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::from_file(&missing),
            Err(ConfigError::Io(p, _)) if p == missing
        ));
    }
}
