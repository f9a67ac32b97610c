//! Configuration for Simdex

mod embedding;
mod logging;
mod server;
mod store;

pub use embedding::{EmbeddingConfig, ImageEmbeddingConfig, TextEmbeddingConfig};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use server::HttpConfig;
pub use store::StoreConfig;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for a Simdex node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Vector store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// HTTP API server configuration
    #[serde(default)]
    pub http: HttpConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// After deserializing, this validates all fields and resolves the image
    /// model path from the data directory so callers don't need to remember
    /// to call `resolve_paths` themselves.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;
        config.validate()?;
        if let Some(image) = config.embedding.image.as_mut() {
            image.resolve_paths(&config.store.data_dir);
        }
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass rather than playing whack-a-mole.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // Store validation
        if self.store.data_dir.as_os_str().is_empty() {
            errors.push("data_dir must not be empty".to_string());
        }
        if self.store.hnsw_m == 0 {
            errors.push("HNSW M parameter must be positive".to_string());
        }
        if self.store.hnsw_ef_construction == 0 {
            errors.push("ef_construction must be positive".to_string());
        }
        if self.store.hnsw_ef_search == 0 {
            errors.push("ef_search must be positive".to_string());
        }
        if self.store.max_capacity == 0 {
            errors.push("max_capacity must be positive".to_string());
        }

        // Text embedding validation
        if let Some(text) = &self.embedding.text {
            if text.endpoint.is_empty() {
                errors.push("text embedding endpoint must not be empty".to_string());
            }
            if text.dimensions == 0 {
                errors.push("text embedding dimensions must be positive".to_string());
            }
            if text.dimensions > 4096 {
                errors.push("text embedding dimensions must be <= 4096".to_string());
            }
        }

        // Image embedding validation
        if let Some(image) = &self.embedding.image {
            if image.dimensions == 0 {
                errors.push("image embedding dimensions must be positive".to_string());
            }
            if image.image_size == 0 {
                errors.push("image_size must be positive".to_string());
            }
            if image.num_threads == 0 {
                errors.push("num_threads must be positive".to_string());
            }
        }

        // HTTP config validation
        if self.http.enabled && !self.http.listen_addr.is_empty() {
            // Extract port from listen_addr (format: "host:port")
            if let Some(port_str) = self.http.listen_addr.rsplit(':').next() {
                if let Ok(port) = port_str.parse::<u32>() {
                    if port == 0 || port > 65535 {
                        errors.push(format!(
                            "HTTP listen port must be between 1 and 65535, got {}",
                            port
                        ));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn default_config_passes_validation() {
        let cfg = valid_config();
        assert!(cfg.validate().is_ok(), "default config should be valid");
    }

    #[test]
    fn validate_rejects_empty_data_dir() {
        let mut cfg = valid_config();
        cfg.store.data_dir = PathBuf::from("");
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("data_dir must not be empty"));
    }

    #[test]
    fn validate_rejects_hnsw_m_zero() {
        let mut cfg = valid_config();
        cfg.store.hnsw_m = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("HNSW M parameter must be positive"));
    }

    #[test]
    fn validate_rejects_zero_text_dimensions() {
        let mut cfg = valid_config();
        cfg.embedding.text = Some(TextEmbeddingConfig {
            endpoint: "http://localhost:1234/v1/embeddings".to_string(),
            api_key: None,
            model: "m".to_string(),
            dimensions: 0,
            timeout_secs: 30,
        });
        let err = cfg.validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("text embedding dimensions must be positive"));
    }

    #[test]
    fn validate_rejects_oversized_text_dimensions() {
        let mut cfg = valid_config();
        cfg.embedding.text = Some(TextEmbeddingConfig {
            endpoint: "http://localhost:1234/v1/embeddings".to_string(),
            api_key: None,
            model: "m".to_string(),
            dimensions: 5000,
            timeout_secs: 30,
        });
        let err = cfg.validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("text embedding dimensions must be <= 4096"));
    }

    #[test]
    fn validate_rejects_http_port_zero() {
        let mut cfg = valid_config();
        cfg.http.enabled = true;
        cfg.http.listen_addr = "0.0.0.0:0".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("HTTP listen port must be between 1 and 65535"));
    }

    #[test]
    fn validate_skips_http_port_check_when_disabled() {
        let mut cfg = valid_config();
        cfg.http.enabled = false;
        cfg.http.listen_addr = "0.0.0.0:0".to_string();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let mut cfg = valid_config();
        cfg.store.hnsw_m = 0;
        cfg.store.hnsw_ef_search = 0;
        cfg.store.max_capacity = 0;
        let err = cfg.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("HNSW M parameter must be positive"));
        assert!(msg.contains("ef_search must be positive"));
        assert!(msg.contains("max_capacity must be positive"));
    }

    #[test]
    fn load_parses_full_config_from_toml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("simdex.toml");
        std::fs::write(
            &path,
            r#"
[store]
data_dir = ".data"
hnsw_m = 8

[embedding.text]
endpoint = "http://localhost:1234/v1/embeddings"
model = "nomic-embed-text-v1.5"
dimensions = 768

[http]
listen_addr = "127.0.0.1:5500"

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.store.data_dir, PathBuf::from(".data"));
        assert_eq!(config.store.hnsw_m, 8);
        assert_eq!(config.store.hnsw_ef_search, 100);
        let text = config.embedding.text.unwrap();
        assert_eq!(text.dimensions, 768);
        assert_eq!(config.http.listen_addr, "127.0.0.1:5500");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.embedding.image.is_none());
    }

    #[test]
    fn load_rejects_invalid_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("simdex.toml");
        std::fs::write(&path, "[store]\nhnsw_m = 0\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
