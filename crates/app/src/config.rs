//! Server configuration
//!
//! Looked up in order: `$ROUNDTABLE_CONFIG`, `<config dir>/config.toml`,
//! built-in defaults. `$PORT` overrides the configured port.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use roundtable_core::RoomConfig;
use roundtable_net::DEFAULT_PORT;
use serde::Deserialize;

/// Env var naming an explicit config file
pub const CONFIG_ENV: &str = "ROUNDTABLE_CONFIG";

/// Env var overriding the listen port
pub const PORT_ENV: &str = "PORT";

/// Accepted range for `room.max_number`; the pool is materialized up front
pub const MAX_NUMBER_RANGE: RangeInclusive<u32> = 1..=10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),
    #[error("room.max_number must be between 1 and 10000, got {0}")]
    InvalidMaxNumber(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind: IpAddr,
    pub port: u16,
    /// TOML file holding `[[themes]]`
    pub themes_path: Option<PathBuf>,
    pub room: RoomConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            themes_path: None,
            room: RoomConfig::default(),
        }
    }
}

impl Config {
    /// Resolve the config from the environment and the filesystem
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match explicit.or_else(default_config_path) {
            Some(path) if path.exists() => Self::load_from_path(&path)?,
            Some(path) => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        if let Ok(port) = std::env::var(PORT_ENV) {
            config.port = parse_port(&port)?;
        }

        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !MAX_NUMBER_RANGE.contains(&self.room.max_number) {
            return Err(ConfigError::InvalidMaxNumber(self.room.max_number));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "onyx", "roundtable").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidPort(value.to_string()))
}
