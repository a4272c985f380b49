use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Remote Sonarr server connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key (normally loaded from environment, never serialized back out)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    /// Records requested per queue page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            page_size: default_page_size(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8989".to_string()
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(30)
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_page_size() -> u32 {
    100
}

/// Poll loop behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SweepConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval: HumanDuration,
    /// Upper bound for the sleep after consecutive failed fetches.
    /// Unset means failures never stretch the interval.
    #[serde(default)]
    pub max_backoff: Option<HumanDuration>,
    /// Log matches without deleting them
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            max_backoff: None,
            dry_run: false,
        }
    }
}

fn default_poll_interval() -> HumanDuration {
    HumanDuration::from_secs(60)
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.base_url, "http://localhost:8989");
        assert!(config.server.api_key.is_none());
        assert_eq!(config.server.page_size, 100);
        assert_eq!(config.sweep.poll_interval, HumanDuration::from_secs(60));
        assert!(config.sweep.max_backoff.is_none());
        assert!(!config.sweep.dry_run);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let mut config = Config::default();
        config.server.api_key = Some("secret".to_string());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"poll_interval\":\"1m\""));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[sweep]
poll_interval = "5m"
dry_run = true
            "#,
        )
        .unwrap();

        assert_eq!(config.sweep.poll_interval, HumanDuration::from_secs(300));
        assert!(config.sweep.dry_run);
        assert_eq!(config.server.base_url, "http://localhost:8989");
    }
}
