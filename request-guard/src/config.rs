use crate::guard::GuardConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Timeout of the web client's HTTP instance, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 1_000_000;

/// Configuration for a [`GuardedClient`](crate::GuardedClient)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix for relative request URLs
    pub base_url: Option<String>,
    /// Transport timeout; `0` disables it
    pub timeout_ms: u64,
    /// Headers sent with every request unless the request sets its own
    pub default_headers: BTreeMap<String, String>,
    pub guard: GuardConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            default_headers: BTreeMap::new(),
            guard: GuardConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: ClientConfig =
            serde_json::from_value(json!({"base_url": "http://localhost:8080"})).unwrap();

        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.default_headers.is_empty());
        assert!(config.guard.enabled);
    }

    #[test]
    fn test_guard_can_be_disabled() {
        let config: ClientConfig = serde_json::from_value(json!({
            "timeout_ms": 0,
            "guard": {"enabled": false},
        }))
        .unwrap();

        assert!(!config.guard.enabled);
        assert_eq!(config.timeout(), None);
    }
}
