//! Server configuration, loaded from a TOML file at startup.

mod validation;

pub use validation::{validate, ValidationError};

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Pretty
    }
}

fn default_listen() -> String {
    "127.0.0.1:8765".to_string()
}

fn default_outbound_capacity() -> usize {
    128
}

fn default_max_frame_bytes() -> usize {
    1_048_576
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Kept as a raw string rather than `SocketAddr` so a malformed address
    /// fails in `validate()` alongside every other problem in the file,
    /// instead of aborting `toml::from_str` before validation ever runs.
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_outbound_capacity")]
    pub outbound_queue_capacity: usize,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Parse `listen` into a socket address. Only meaningful to call after
    /// `validate()` has returned `Ok` — that's what guarantees this parse
    /// succeeds, so callers past that point are expected to unwrap it.
    pub fn listen_addr(&self) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
        self.listen.parse()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            outbound_queue_capacity: default_outbound_capacity(),
            max_frame_bytes: default_max_frame_bytes(),
            log_format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from `path`. Missing file is not an error here;
    /// callers that want "no file -> defaults" behavior should check
    /// existence themselves before calling this.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config = toml::from_str(&raw)?;
        Ok(config)
    }
}
