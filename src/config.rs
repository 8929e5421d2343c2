//! Process configuration.
//!
//! Loaded once at startup from a TOML file; every key is optional.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0:8080"
//!
//! [log]
//! level = "info,reef=debug"   # EnvFilter syntax
//! directory = "/var/log/app"  # omit to log to stdout only
//! file_prefix = "app.log"
//! rotation = "daily"          # minutely | hourly | daily | never
//! ```
//!
//! ## Environment overrides
//!
//! | Variable | Replaces |
//! |---|---|
//! | `REEF_HOST` | `server.host` |
//! | `RUST_LOG` | `log.level` |

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;

pub const HOST_ENV: &str = "REEF_HOST";
pub const LOG_ENV: &str = "RUST_LOG";

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub log: LogConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1:8080".to_owned() }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub level: String,
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
    pub rotation: Rotation,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            directory: None,
            file_prefix: "reef.log".to_owned(),
            rotation: Rotation::Daily,
        }
    }
}

/// How often the log file rolls over.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text).map_err(|e| match e {
            Error::Config { message, .. } => Error::Config { path: path.display().to_string(), message },
            other => other,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        toml::from_str(text).map_err(|e| Error::Config { path: "<inline>".to_owned(), message: e.to_string() })
    }

    /// Applies [`HOST_ENV`] and [`LOG_ENV`] when set.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(host) = lookup(HOST_ENV).filter(|h| !h.is_empty()) {
            self.server.host = host;
        }
        if let Some(level) = lookup(LOG_ENV).filter(|l| !l.is_empty()) {
            self.log.level = level;
        }
        self
    }
}
