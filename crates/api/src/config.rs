//! Application configuration

use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // CORS
    pub cors_origins: Vec<String>,

    // WebSocket maintenance
    pub ws_ping_interval_secs: u64,
    pub ws_eviction_interval_secs: u64,
    pub ws_stale_after_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),

            // CORS
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| {
                    "http://localhost:3000,http://localhost:8000,http://127.0.0.1:3000,http://127.0.0.1:8000".to_string()
                })
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),

            // WebSocket maintenance
            ws_ping_interval_secs: env::var("WS_PING_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            ws_eviction_interval_secs: env::var("WS_EVICTION_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            ws_stale_after_secs: env::var("WS_STALE_AFTER_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .unwrap_or(3600),
        };

        if config.ws_ping_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "WS_PING_INTERVAL_SECS must be greater than zero",
            ));
        }
        if config.ws_eviction_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "WS_EVICTION_INTERVAL_SECS must be greater than zero",
            ));
        }
        // A threshold at or below the ping cadence would evict connections
        // that are simply waiting for their next sweep.
        if config.ws_stale_after_secs <= config.ws_ping_interval_secs {
            return Err(ConfigError::Invalid(
                "WS_STALE_AFTER_SECS must exceed WS_PING_INTERVAL_SECS",
            ));
        }

        Ok(config)
    }

    /// Cadence of the liveness ping sweep
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ws_ping_interval_secs)
    }

    /// Cadence of the stale-connection eviction pass
    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.ws_eviction_interval_secs)
    }

    /// Maximum allowed age of a connection's last confirmed liveness
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.ws_stale_after_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env() {
        env::remove_var("BIND_ADDRESS");
        env::remove_var("CORS_ORIGINS");
        env::remove_var("WS_PING_INTERVAL_SECS");
        env::remove_var("WS_EVICTION_INTERVAL_SECS");
        env::remove_var("WS_STALE_AFTER_SECS");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8000");
        assert_eq!(config.ws_ping_interval_secs, 30);
        assert_eq!(config.ws_eviction_interval_secs, 300);
        assert_eq!(config.ws_stale_after_secs, 3600);
        assert_eq!(config.cors_origins.len(), 4);
    }

    #[test]
    #[serial]
    fn test_custom_values() {
        clear_env();
        env::set_var("BIND_ADDRESS", "127.0.0.1:9000");
        env::set_var("CORS_ORIGINS", "https://dash.example.com, https://ops.example.com");
        env::set_var("WS_PING_INTERVAL_SECS", "10");
        env::set_var("WS_STALE_AFTER_SECS", "120");

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(
            config.cors_origins,
            vec!["https://dash.example.com", "https://ops.example.com"]
        );
        assert_eq!(config.ws_ping_interval_secs, 10);
        assert_eq!(config.ws_stale_after_secs, 120);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparseable_values_fall_back_to_defaults() {
        clear_env();
        env::set_var("WS_PING_INTERVAL_SECS", "not-a-number");

        let config = Config::from_env().unwrap();
        assert_eq!(config.ws_ping_interval_secs, 30);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_stale_threshold_must_exceed_ping_interval() {
        clear_env();
        env::set_var("WS_PING_INTERVAL_SECS", "60");
        env::set_var("WS_STALE_AFTER_SECS", "60");

        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_ping_interval_rejected() {
        clear_env();
        env::set_var("WS_PING_INTERVAL_SECS", "0");

        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        clear_env();
    }
}
