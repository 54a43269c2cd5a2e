//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `heatkeeper.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use heatkeeper_domain::error::HeatKeeperError;
use heatkeeper_domain::id::{UserId, ZoneId};
use heatkeeper_domain::presence::Presence;
use heatkeeper_domain::rule::ZoneConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Vendor polling settings.
    pub poller: PollerConfig,
    /// Rule sets, one entry per controlled zone.
    pub zones: Vec<ZoneConfig>,
    /// Initial content of the simulated vendor.
    pub simulation: SimulationConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Seconds between two polls.
    pub interval_secs: u64,
}

/// Zones and users the simulated vendor starts with.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub zones: Vec<SimulatedZoneConfig>,
    pub users: Vec<SimulatedUserConfig>,
}

#[derive(Debug, Deserialize)]
pub struct SimulatedZoneConfig {
    pub id: ZoneId,
    pub name: String,
    /// Start with an indefinite manual overlay at this temperature.
    #[serde(default)]
    pub manual: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SimulatedUserConfig {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub presence: Presence,
}

impl Config {
    /// Load configuration from `heatkeeper.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("heatkeeper.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HEATKEEPER_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("HEATKEEPER_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("HEATKEEPER_POLL_INTERVAL_SECS")
            && let Ok(secs) = val.parse()
        {
            self.poller.interval_secs = secs;
        }
        if let Ok(val) = std::env::var("HEATKEEPER_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.poller.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "poll interval must be non-zero".to_string(),
            ));
        }
        for zone in &self.zones {
            zone.validate().map_err(|source| ConfigError::Zone {
                zone: zone.zone.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poller.interval_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "heatkeeperd=info,heatkeeper_app=info,heatkeeper_adapter_virtual=info,tower_http=debug"
                .to_string(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// A zone's rule set is malformed.
    #[error("invalid rules for zone {zone:?}")]
    Zone {
        zone: String,
        #[source]
        source: HeatKeeperError,
    },
}
