//! Configuration file handling

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Where the daemon's HTTP API lives
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Retry settings for `start`
    #[serde(default)]
    pub retry: RetryConfig,

    /// Status relay settings
    #[serde(default)]
    pub relay: RelayConfig,
}

/// Daemon endpoint configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DaemonConfig {
    /// Host the daemon listens on
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the daemon listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deadline for a single request
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout(),
        }
    }
}

impl DaemonConfig {
    /// Base URL of the daemon API, e.g. `http://localhost:9999/api`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/api", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    9999
}
fn default_timeout() -> u64 {
    5
}

/// Retry settings for the start command
#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// Retries after the first failed attempt
    #[serde(default = "default_start_retries")]
    pub start_retries: u32,

    /// Fixed delay between attempts
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            start_retries: default_start_retries(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

fn default_start_retries() -> u32 {
    3
}
fn default_delay_ms() -> u64 {
    1500
}

/// Status relay settings
#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    /// Time between status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Updates buffered per listener before it starts lagging
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl RelayConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_poll_interval() -> u64 {
    2000
}
fn default_channel_capacity() -> usize {
    32
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.daemon.port == 0 {
            return Err(super::Error::Config("daemon.port must be non-zero".to_string()));
        }
        if self.daemon.timeout_secs == 0 {
            return Err(super::Error::Config(
                "daemon.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.relay.poll_interval_ms == 0 {
            return Err(super::Error::Config(
                "relay.poll_interval_ms must be non-zero".to_string(),
            ));
        }
        if self.relay.channel_capacity == 0 {
            return Err(super::Error::Config(
                "relay.channel_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
