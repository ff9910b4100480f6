//! Runtime configuration read from the environment

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8000);
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_CLOCK_TICK_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Directory served for non-API paths
    pub static_dir: String,
    /// How often turn clocks check their deadline
    pub clock_tick: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR,
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            clock_tick: Duration::from_millis(DEFAULT_CLOCK_TICK_MS),
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl AppConfig {
    /// Load config from env vars:
    /// - DARTS_BIND_ADDR: listen address (default 0.0.0.0:8000)
    /// - DARTS_STATIC_DIR: static file directory (default "static")
    /// - DARTS_CLOCK_TICK_MS: turn clock poll period in ms (default 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = match env_value("DARTS_BIND_ADDR") {
            Some(raw) => raw.parse::<SocketAddr>().unwrap_or_else(|e| {
                tracing::warn!(
                    "Invalid DARTS_BIND_ADDR '{}': {}. Using {}",
                    raw,
                    e,
                    DEFAULT_BIND_ADDR
                );
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        let static_dir = env_value("DARTS_STATIC_DIR").unwrap_or(defaults.static_dir);

        let clock_tick = match env_value("DARTS_CLOCK_TICK_MS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    tracing::warn!(
                        "Invalid DARTS_CLOCK_TICK_MS '{}'. Using {}ms",
                        raw,
                        DEFAULT_CLOCK_TICK_MS
                    );
                    defaults.clock_tick
                }
            },
            None => defaults.clock_tick,
        };

        Self {
            bind_addr,
            static_dir,
            clock_tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("DARTS_BIND_ADDR");
        std::env::remove_var("DARTS_STATIC_DIR");
        std::env::remove_var("DARTS_CLOCK_TICK_MS");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = AppConfig::from_env();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.static_dir, "static");
        assert_eq!(config.clock_tick, Duration::from_secs(1));
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("DARTS_BIND_ADDR", "127.0.0.1:9000");
        std::env::set_var("DARTS_STATIC_DIR", " public ");
        std::env::set_var("DARTS_CLOCK_TICK_MS", "250");

        let config = AppConfig::from_env();
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.static_dir, "public");
        assert_eq!(config.clock_tick, Duration::from_millis(250));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("DARTS_BIND_ADDR", "not-an-address");
        std::env::set_var("DARTS_CLOCK_TICK_MS", "0");

        let config = AppConfig::from_env();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.clock_tick, Duration::from_secs(1));
        clear_env();
    }
}
