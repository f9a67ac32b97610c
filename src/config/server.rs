//! HTTP API server configuration

use serde::{Deserialize, Serialize};

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// HTTP API server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whether the HTTP API is enabled for `serve`
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Listen address ("host:port")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Valid API keys; empty means no authentication required
    #[serde(default)]
    pub api_keys: Vec<String>,
    /// Enable permissive CORS headers
    #[serde(default)]
    pub cors_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: default_listen_addr(),
            api_keys: Vec::new(),
            cors_enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HttpConfig::default();
        assert!(config.enabled);
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert!(config.api_keys.is_empty());
        assert!(!config.cors_enabled);
    }
}
