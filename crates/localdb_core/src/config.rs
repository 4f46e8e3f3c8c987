//! Database configuration.

use crate::error::CoreError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for opening a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root directory; only used when opened from a connection string.
    pub group_path: Option<PathBuf>,

    /// Whether to create the root directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Write new objects in binary instead of text.
    pub prefer_binary: bool,

    /// Guard each transaction with a cross-process named lock.
    ///
    /// Requires the `named-lock` feature.
    pub named_locks: bool,

    /// Directory for lock files. Defaults to `<tmp>/localdb-locks`.
    pub lock_dir: Option<PathBuf>,

    /// How long to wait for a named lock before giving up.
    pub lock_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            group_path: None,
            create_if_missing: true,
            prefer_binary: true,
            named_locks: false,
            lock_dir: None,
            lock_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the root directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether objects are written in binary.
    #[must_use]
    pub const fn prefer_binary(mut self, value: bool) -> Self {
        self.prefer_binary = value;
        self
    }

    /// Sets whether transactions take a named lock.
    #[must_use]
    pub const fn named_locks(mut self, value: bool) -> Self {
        self.named_locks = value;
        self
    }

    /// Sets the lock timeout.
    #[must_use]
    pub const fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Sets the directory holding lock files.
    #[must_use]
    pub fn lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(dir.into());
        self
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, CoreError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(CoreError::invalid_operation(format!(
            "connection string: {key} expects a boolean, got {value:?}"
        ))),
    }
}

/// Parses a connection string such as
/// `groupPath=/data/db;binary=true;locks=false`.
///
/// Keys: `groupPath`, `binary`, `createIfMissing`, `locks`, `lockDir`,
/// `lockTimeoutMs`. Unknown keys are rejected.
impl FromStr for Config {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = Self::default();

        for pair in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                CoreError::invalid_operation(format!("connection string: expected key=value, got {pair:?}"))
            })?;
            let (key, value) = (key.trim(), value.trim());

            match key {
                "groupPath" => config.group_path = Some(PathBuf::from(value)),
                "binary" => config.prefer_binary = parse_bool(key, value)?,
                "createIfMissing" => config.create_if_missing = parse_bool(key, value)?,
                "locks" => config.named_locks = parse_bool(key, value)?,
                "lockDir" => config.lock_dir = Some(PathBuf::from(value)),
                "lockTimeoutMs" => {
                    let ms = value.parse::<u64>().map_err(|_| {
                        CoreError::invalid_operation(format!(
                            "connection string: lockTimeoutMs expects milliseconds, got {value:?}"
                        ))
                    })?;
                    config.lock_timeout = Duration::from_millis(ms);
                }
                _ => {
                    return Err(CoreError::invalid_operation(format!(
                        "connection string: unknown key {key:?}"
                    )))
                }
            }
        }

        Ok(config)
    }
}
