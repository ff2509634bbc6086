use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::Timestamp;

pub const DEFAULT_COOLDOWN_SECS: Timestamp = 20;
pub const DEFAULT_RETENTION_SECS: Timestamp = 24 * 60 * 60;
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_LOG_PATH: &str = "./cache/page-lock.json";
pub const DEFAULT_REDIS_KEY: &str = "presence:log";
pub const DEFAULT_RESOURCE_LABEL: &str = "page";

/// Which heartbeat store backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File,
    Redis,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "file" => Ok(StoreBackend::File),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(format!("unknown backend {other:?}, expected memory, file or redis")),
        }
    }
}

/// Runtime configuration shared by the server, the engine and the agent.
///
/// Windows are in seconds, the unit of heartbeat timestamps.
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    pub cooldown_window: Timestamp,
    pub retention_window: Timestamp,
    pub heartbeat_interval: Duration,
    pub request_timeout: Duration,
    pub log_location: PathBuf,
    pub backend: StoreBackend,
    pub redis_host: String,
    pub redis_key: String,
    pub bind_addr: SocketAddr,
    pub resource_label: String,
    pub verbose: bool,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            cooldown_window: DEFAULT_COOLDOWN_SECS,
            retention_window: DEFAULT_RETENTION_SECS,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            log_location: PathBuf::from(DEFAULT_LOG_PATH),
            backend: StoreBackend::File,
            redis_host: "127.0.0.1".to_string(),
            redis_key: DEFAULT_REDIS_KEY.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            resource_label: DEFAULT_RESOURCE_LABEL.to_string(),
            verbose: false,
        }
    }
}

impl PresenceConfig {
    /// Load configuration from `PRESENCE_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from an arbitrary
    /// key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cooldown_window = match get("PRESENCE_COOLDOWN_SECS") {
            Some(v) => parse_window("PRESENCE_COOLDOWN_SECS", &v)?,
            None => defaults.cooldown_window,
        };
        let retention_window = match get("PRESENCE_RETENTION_SECS") {
            Some(v) => parse_window("PRESENCE_RETENTION_SECS", &v)?,
            None => defaults.retention_window,
        };
        let heartbeat_interval = match get("PRESENCE_HEARTBEAT_INTERVAL_SECS") {
            Some(v) => parse_interval("PRESENCE_HEARTBEAT_INTERVAL_SECS", &v)?,
            None => defaults.heartbeat_interval,
        };
        let request_timeout = match get("PRESENCE_REQUEST_TIMEOUT_SECS") {
            Some(v) => parse_interval("PRESENCE_REQUEST_TIMEOUT_SECS", &v)?,
            None => defaults.request_timeout,
        };
        let backend = match get("PRESENCE_BACKEND") {
            Some(v) => v
                .parse()
                .map_err(|reason| ConfigError::invalid("PRESENCE_BACKEND", &v, reason))?,
            None => defaults.backend,
        };
        let bind_addr = match get("PRESENCE_BIND") {
            Some(v) => v
                .parse()
                .map_err(|e| ConfigError::invalid("PRESENCE_BIND", &v, e))?,
            None => defaults.bind_addr,
        };
        let verbose = match get("PRESENCE_VERBOSE") {
            Some(v) => parse_flag("PRESENCE_VERBOSE", &v)?,
            None => defaults.verbose,
        };

        Ok(Self {
            cooldown_window,
            retention_window,
            heartbeat_interval,
            request_timeout,
            log_location: get("PRESENCE_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_location),
            backend,
            redis_host: get("REDIS_HOST").unwrap_or(defaults.redis_host),
            redis_key: get("PRESENCE_REDIS_KEY").unwrap_or(defaults.redis_key),
            bind_addr,
            resource_label: get("PRESENCE_RESOURCE_LABEL").unwrap_or(defaults.resource_label),
            verbose,
        })
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}", self.redis_host)
    }
}

fn parse_window(key: &'static str, value: &str) -> Result<Timestamp, ConfigError> {
    let secs: Timestamp = value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid(key, value, e))?;
    if secs < 0 {
        return Err(ConfigError::invalid(key, value, "must not be negative"));
    }
    Ok(secs)
}

fn parse_interval(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid(key, value, e))?;
    if secs == 0 {
        return Err(ConfigError::invalid(key, value, "must be at least one second"));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, value, "expected a boolean")),
    }
}
