//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Controller configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Lander simulator endpoint (command/telemetry exchange)
    pub lander_addr: SocketAddr,
    /// Dashboard observer endpoint (best-effort broadcast)
    pub dashboard_addr: SocketAddr,
    /// Local UDP binding address
    pub bind_addr: SocketAddr,

    /// Fast tick: input sampling and lander sync
    pub fast_tick: Duration,
    /// Slow tick: dashboard broadcast
    pub slow_tick: Duration,
    /// Display refresh interval
    pub display_tick: Duration,
    /// Upper bound on waiting for a lander reply
    pub recv_timeout: Duration,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = |key: &'static str, default: &str| -> Result<SocketAddr, ConfigError> {
            lookup(key)
                .unwrap_or_else(|| default.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(key))
        };

        let millis = |key: &'static str, default: u64| -> Result<Duration, ConfigError> {
            let ms = match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidInterval(key))?,
                None => default,
            };
            if ms == 0 {
                return Err(ConfigError::InvalidInterval(key));
            }
            Ok(Duration::from_millis(ms))
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(_) => return Err(ConfigError::InvalidLogFormat),
        };

        Ok(Self {
            lander_addr: addr("LANDER_ADDR", "192.168.80.5:65200")?,
            dashboard_addr: addr("DASHBOARD_ADDR", "192.168.80.5:65250")?,
            bind_addr: addr("BIND_ADDR", "0.0.0.0:0")?,

            fast_tick: millis("FAST_TICK_MS", 20)?,
            slow_tick: millis("SLOW_TICK_MS", 100)?,
            display_tick: millis("DISPLAY_TICK_MS", 1000)?,
            recv_timeout: millis("RECV_TIMEOUT_MS", 100)?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid socket address in {0}")]
    InvalidAddress(&'static str),

    #[error("Invalid interval in {0}: expected a positive number of milliseconds")]
    InvalidInterval(&'static str),

    #[error("Invalid LOG_FORMAT: expected 'pretty' or 'json'")]
    InvalidLogFormat,
}
