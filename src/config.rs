//! Server configuration.
//!
//! Precedence (highest first): recognized environment variables, `config.json`
//! in the working directory, compiled-in defaults. Errors while reading or
//! parsing are printed to stderr and the defaults are kept — startup never
//! fails on a bad config file.
//!
//! Recognized environment keys: `PORT`, `DATA_FILE`, `ALLOWED_ORIGINS`,
//! `ALLOW_SAME_HOST`, `AUTO_SAVE_INTERVAL`, `CLEANUP_INTERVAL`,
//! `ROOM_MAX_AGE`, `DISCONNECT_GRACE_PERIOD` (intervals in seconds). Logging
//! is configured via the `logging` section of `config.json`, with `RUST_LOG`
//! as the fallback filter.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Config {
    /// RPC/push listen port.
    pub port: u16,
    /// Snapshot location.
    pub data_file: PathBuf,
    /// Exact Origin values allowed by CORS. Empty means same-host only (or
    /// nothing, when `allow_same_host` is off too).
    pub allowed_origins: Vec<String>,
    /// Additionally allow requests whose Origin hostname equals the request
    /// Host.
    pub allow_same_host: bool,
    /// Seconds between snapshot saves.
    pub auto_save_interval: u64,
    /// Seconds between stale-room scans.
    pub cleanup_interval: u64,
    /// Seconds of inactivity before a room is garbage collected.
    pub room_max_age: u64,
    /// Seconds a disconnected player may stay before removal.
    pub disconnect_grace_period: u64,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            data_file: PathBuf::from("rooms.json"),
            allowed_origins: Vec::new(),
            allow_same_host: false,
            auto_save_interval: 30,
            cleanup_interval: 3600,
            room_max_age: 86_400,
            disconnect_grace_period: 30,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn auto_save_interval(&self) -> Duration {
        Duration::from_secs(self.auto_save_interval)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    pub fn room_max_age(&self) -> Duration {
        Duration::from_secs(self.room_max_age)
    }

    pub fn disconnect_grace_period(&self) -> Duration {
        Duration::from_secs(self.disconnect_grace_period)
    }

    /// Load from `config.json` in the working directory, then apply
    /// environment overrides.
    #[must_use]
    pub fn load() -> Self {
        Self::load_from(Path::new("config.json"))
    }

    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(err) => {
                    eprintln!(
                        "Failed to parse config from {}: {err}; using defaults",
                        path.display()
                    );
                    Self::default()
                }
            },
            // A missing config file is the normal case.
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Some(port) = env_parsed::<u16>("PORT") {
            self.port = port;
        }
        if let Ok(raw) = std::env::var("DATA_FILE") {
            if !raw.trim().is_empty() {
                self.data_file = PathBuf::from(raw.trim());
            }
        }
        if let Ok(raw) = std::env::var("ALLOWED_ORIGINS") {
            self.allowed_origins = parse_csv(&raw);
        }
        if let Ok(raw) = std::env::var("ALLOW_SAME_HOST") {
            self.allow_same_host = env_var_truthy(&raw);
        }
        if let Some(value) = env_parsed::<u64>("AUTO_SAVE_INTERVAL") {
            self.auto_save_interval = value;
        }
        if let Some(value) = env_parsed::<u64>("CLEANUP_INTERVAL") {
            self.cleanup_interval = value;
        }
        if let Some(value) = env_parsed::<u64>("ROOM_MAX_AGE") {
            self.room_max_age = value;
        }
        if let Some(value) = env_parsed::<u64>("DISCONNECT_GRACE_PERIOD") {
            self.disconnect_grace_period = value;
        }
    }
}

fn env_parsed<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(err) => {
            eprintln!("Invalid {key}='{raw}': {err}; keeping default");
            None
        }
    }
}

pub fn env_var_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Directory path for log files
    pub dir: String,
    /// Log file base name
    pub filename: String,
    /// Rotation policy: "daily" (default), "hourly", or "never"
    pub rotation: String,
    /// Optional tracing level; `RUST_LOG` is consulted when unset
    pub level: Option<LogLevel>,
    /// Enable rolling file logging in addition to stdout logs
    pub enable_file_logging: bool,
    /// Format for rendered logs
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            filename: "server.log".to_string(),
            rotation: "daily".to_string(),
            level: None,
            enable_file_logging: false,
            format: LogFormat::Text,
        }
    }
}

/// Log level enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "err" => Ok(Self::Error),
            other => Err(serde::de::Error::custom(format!(
                "invalid log level '{other}', expected one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log format enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Text,
}
