//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Only the bind address is mandatory to
//! get right; everything else is a tuning knob with a working default.

use std::net::SocketAddr;
use std::time::Duration;

/// Default bind address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:15542";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to.
    pub listen_addr: SocketAddr,

    /// Interval between liveness pings to each subscriber.
    pub ping_interval: Duration,

    /// Deadline for any single write to a subscriber.
    pub write_timeout: Duration,

    /// Capacity of the broadcast queue.
    pub queue_capacity: usize,

    /// Longest a producer waits for a free slot in a full queue.
    pub submit_timeout: Duration,

    /// Timeout applied to REST requests.
    pub request_timeout: Duration,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 15542)),
            ping_interval: Duration::from_secs(30),
            write_timeout: Duration::from_millis(5_000),
            queue_capacity: 1_024,
            submit_timeout: Duration::from_millis(1_000),
            request_timeout: Duration::from_secs(10),
            log_format: LogFormat::Text,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is missing, unparsable or
    /// zero. Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as a
    /// [`SocketAddr`].
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
            .parse()?;

        let ping_interval = Duration::from_secs(parse_env_nonzero(
            "PING_INTERVAL_SECS",
            defaults.ping_interval.as_secs(),
        ));
        let write_timeout = Duration::from_millis(parse_env_nonzero(
            "WRITE_TIMEOUT_MS",
            millis(defaults.write_timeout),
        ));
        let queue_capacity = parse_env_nonzero("BROADCAST_QUEUE_CAPACITY", defaults.queue_capacity);
        let submit_timeout = Duration::from_millis(parse_env_nonzero(
            "SUBMIT_TIMEOUT_MS",
            millis(defaults.submit_timeout),
        ));
        let request_timeout = Duration::from_secs(parse_env_nonzero(
            "REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        ));

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            ping_interval,
            write_timeout,
            queue_capacity,
            submit_timeout,
            request_timeout,
            log_format,
        })
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Parses an environment variable as `T`, returning `default` on missing,
/// invalid or zero values.
fn parse_env_nonzero<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + PartialEq + Default,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|v: &T| *v != T::default())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.listen_addr.port(), 15542);
        assert_eq!(cfg.ping_interval, Duration::from_secs(30));
        assert_eq!(cfg.write_timeout, Duration::from_secs(5));
        assert_eq!(cfg.queue_capacity, 1_024);
        assert_eq!(cfg.log_format, LogFormat::Text);
    }

    #[test]
    fn default_listen_addr_constant_parses() {
        let parsed: Result<SocketAddr, _> = DEFAULT_LISTEN_ADDR.parse();
        assert_eq!(parsed.ok(), Some(RelayConfig::default().listen_addr));
    }

    #[test]
    fn missing_variable_falls_back_to_default() {
        assert_eq!(
            parse_env_nonzero("WS_RELAY_TEST_UNSET_VARIABLE", 42usize),
            42
        );
    }
}
