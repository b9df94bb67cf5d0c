//! Configuration module for the acquisition tools
//!
//! Loads a TOML file with three sections: the instrument link (`[scope]`),
//! what to read out (`[acquisition]`), and where to put it (`[output]`).
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable configuration that the CLI can override.
//!
//! # Example
//! ```ignore
//! let config = Config::load("config.toml")?;
//! config.validate()?;
//! let scope = config.scope_config();
//! ```

use crate::scope::{vicp, ScopeConfig};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Channel {0} not valid (expected 1-4)")]
    InvalidChannel(u8),

    #[error("Function {0} not valid (expected 1-4)")]
    InvalidFunction(u8),

    #[error("No channels or functions configured")]
    NoSources,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scope: ScopeSection,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Check channel and function numbers and that at least one source is
    /// requested
    pub fn validate(&self) -> Result<(), ConfigError> {
        for &channel in &self.acquisition.channels {
            if !(1..=4).contains(&channel) {
                return Err(ConfigError::InvalidChannel(channel));
            }
        }
        for &function in &self.acquisition.functions {
            if !(1..=4).contains(&function) {
                return Err(ConfigError::InvalidFunction(function));
            }
        }
        if self.acquisition.channels.is_empty() && self.acquisition.functions.is_empty() {
            return Err(ConfigError::NoSources);
        }
        Ok(())
    }

    /// Connection settings for the scope client
    pub fn scope_config(&self) -> ScopeConfig {
        ScopeConfig {
            host: self.scope.host.clone(),
            port: self.scope.port,
            read_timeout_ms: self.scope.read_timeout_ms,
            settle_ms: self.scope.settle_ms,
        }
    }
}

/// Instrument link configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeSection {
    /// Instrument host name or IP address
    #[serde(default = "default_host")]
    pub host: String,

    /// VICP TCP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Read timeout on the control link in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Settle delay after setup commands in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for ScopeSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            read_timeout_ms: default_read_timeout_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

fn default_host() -> String {
    "192.168.0.40".to_string()
}

fn default_port() -> u16 {
    vicp::DEFAULT_PORT
}

fn default_read_timeout_ms() -> u64 {
    5000
}

fn default_settle_ms() -> u64 {
    50
}

/// What to read out per acquisition
#[derive(Debug, Clone, Deserialize)]
pub struct AcquisitionConfig {
    /// Analog channels to read (1-4)
    #[serde(default)]
    pub channels: Vec<u8>,

    /// Function traces to read (1-4)
    #[serde(default)]
    pub functions: Vec<u8>,

    /// Parameters to read per source, e.g. "AMPL,AREA"
    #[serde(default)]
    pub parameter: Option<String>,

    /// Time per division to set before acquiring, e.g. "10US"
    #[serde(default)]
    pub time_div: Option<String>,

    /// Number of samples to take
    #[serde(default = "default_count")]
    pub count: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            functions: Vec::new(),
            parameter: None,
            time_div: None,
            count: default_count(),
        }
    }
}

fn default_count() -> u32 {
    1
}

/// Output location for acquired samples
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory for sample files
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// File name prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            prefix: default_prefix(),
        }
    }
}

fn default_output_dir() -> String {
    "./data".to_string()
}

fn default_prefix() -> String {
    "sample".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.scope.host, "192.168.0.40");
        assert_eq!(config.scope.port, vicp::DEFAULT_PORT);
        assert_eq!(config.acquisition.count, 1);
        assert!(config.acquisition.channels.is_empty());
        assert_eq!(config.output.dir, "./data");
        assert_eq!(config.output.prefix, "sample");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[scope]
host = "10.0.0.7"
port = 1861
read_timeout_ms = 2000
settle_ms = 20

[acquisition]
channels = [1, 2]
functions = [1]
parameter = "AMPL,AREA"
time_div = "10US"
count = 50

[output]
dir = "/data/runs"
prefix = "pin"
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.scope.host, "10.0.0.7");
        assert_eq!(config.scope.read_timeout_ms, 2000);
        assert_eq!(config.acquisition.channels, vec![1, 2]);
        assert_eq!(config.acquisition.functions, vec![1]);
        assert_eq!(config.acquisition.parameter.as_deref(), Some("AMPL,AREA"));
        assert_eq!(config.acquisition.time_div.as_deref(), Some("10US"));
        assert_eq!(config.acquisition.count, 50);
        assert_eq!(config.output.dir, "/data/runs");
        assert_eq!(config.output.prefix, "pin");

        config.validate().unwrap();
    }

    #[test]
    fn invalid_channel_is_rejected() {
        let toml = r#"
[acquisition]
channels = [1, 5]
"#;
        let config = Config::from_toml(toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidChannel(5))
        ));
    }

    #[test]
    fn invalid_function_is_rejected() {
        let toml = r#"
[acquisition]
functions = [0]
"#;
        let config = Config::from_toml(toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFunction(0))
        ));
    }

    #[test]
    fn no_sources_is_rejected() {
        let config = Config::from_toml("").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::NoSources)));
    }

    #[test]
    fn scope_config_carries_link_settings() {
        let toml = r#"
[scope]
host = "scope.lab"
settle_ms = 0
"#;
        let config = Config::from_toml(toml).unwrap();
        let scope = config.scope_config();
        assert_eq!(scope.host, "scope.lab");
        assert_eq!(scope.settle_ms, 0);
        assert_eq!(scope.read_timeout_ms, 5000);
    }
}
