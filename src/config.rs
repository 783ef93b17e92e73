//! Agentdeck configuration management

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main agentdeck configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentdeckConfig {
    /// Agent backend API configuration
    pub api: ApiConfig,

    /// Message delivery configuration
    pub delivery: DeliveryConfig,

    /// Job polling configuration
    pub polling: PollingConfig,

    /// Duplex channel configuration
    pub channel: ChannelConfig,
}

/// Agent backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the agent backend
    pub base_url: String,

    /// Workspace scope attached to every send, if any
    pub workspace_id: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8820".to_string(),
            workspace_id: None,
            request_timeout_secs: 30,
        }
    }
}

/// How assistant replies are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// One request, one response
    #[default]
    Sync,
    /// Create a server-side job, then poll it to completion
    Async,
}

/// Message delivery configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Delivery mode used by `send_message`
    pub mode: DeliveryMode,
}

/// Job polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Fixed delay between status fetches, in milliseconds
    pub interval_ms: u64,

    /// Attempt budget before the poll loop times out
    pub max_attempts: u32,
}

impl PollingConfig {
    /// Delay between status fetches
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            max_attempts: 120,
        }
    }
}

/// Duplex channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// WebSocket endpoint of the agent backend
    pub url: String,

    /// Reconnect automatically after a close
    pub auto_reconnect: bool,

    /// First reconnect delay, in milliseconds
    pub backoff_base_ms: u64,

    /// Reconnect delay ceiling, in milliseconds
    pub backoff_max_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8820/ws".to_string(),
            auto_reconnect: true,
            backoff_base_ms: 1_000,
            backoff_max_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentdeckConfig::default();

        assert_eq!(config.delivery.mode, DeliveryMode::Sync);
        assert_eq!(config.polling.interval_ms, 1_000);
        assert_eq!(config.polling.max_attempts, 120);
        assert_eq!(config.channel.backoff_base_ms, 1_000);
        assert_eq!(config.channel.backoff_max_ms, 30_000);
        assert!(config.channel.auto_reconnect);
        assert!(config.api.workspace_id.is_none());
    }

    #[test]
    fn test_polling_interval() {
        let polling = PollingConfig {
            interval_ms: 250,
            max_attempts: 4,
        };
        assert_eq!(polling.interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AgentdeckConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: AgentdeckConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.api.base_url, config.api.base_url);
        assert_eq!(parsed.delivery.mode, config.delivery.mode);
        assert_eq!(parsed.polling.max_attempts, config.polling.max_attempts);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = r#"
            [delivery]
            mode = "async"

            [polling]
            max_attempts = 10
        "#;
        let config: AgentdeckConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.delivery.mode, DeliveryMode::Async);
        assert_eq!(config.polling.max_attempts, 10);
        // Everything unspecified keeps its default
        assert_eq!(config.polling.interval_ms, 1_000);
        assert_eq!(config.api.base_url, "http://127.0.0.1:8820");
    }
}
