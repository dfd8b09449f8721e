//! Configuration management for the villa server
//!
//! This module handles all configuration settings with sensible defaults for
//! a single-instance deployment behind the marketing site.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Document store configuration
    pub store: StoreConfig,

    /// Media library configuration
    pub media: MediaConfig,

    /// AI collaborator configuration
    pub ai: AiConfig,

    /// Metrics and monitoring
    pub metrics: MetricsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: SocketAddr,

    /// Number of worker threads (0 = auto-detect)
    pub worker_threads: usize,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Data directory path
    pub data_dir: PathBuf,

    /// Backing file name inside the data directory
    pub db_file: String,

    /// Seed a sample gallery document into a fresh store
    pub seed_sample: bool,
}

/// Media library configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Root directory for uploaded objects
    pub upload_dir: PathBuf,

    /// URL prefix under which stored objects are served
    pub public_base: String,

    /// Maximum accepted upload size per file (bytes)
    pub max_upload_bytes: usize,

    /// Base URL of the external image-processing service, if deployed
    pub processor_url: Option<String>,
}

/// AI collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// API key; empty disables the AI endpoints
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API
    pub api_base: String,

    /// Primary model for vision and text completions
    pub text_model: String,

    /// Fallback model when the primary output is rejected
    pub fallback_model: String,

    /// Attempts per model before giving up
    pub max_retries: u32,

    /// Property name used in prompts and generated content
    pub property_name: String,

    /// One-line property context fed to prompts
    pub property_context: String,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Expose the Prometheus text endpoint at /metrics
    pub enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".parse().unwrap(),
            worker_threads: 0, // Auto-detect
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            db_file: "villa-db.json".to_string(),
            seed_sample: true,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./data/objects"),
            public_base: "/objects".to_string(),
            max_upload_bytes: 50 * 1024 * 1024, // 50MB covers villa walkthrough clips
            processor_url: None,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            text_model: "gpt-4o".to_string(),
            fallback_model: "gpt-4o-mini".to_string(),
            max_retries: 2,
            property_name: "Ko Lake Villa".to_string(),
            property_context: "a premium lakeside property in Sri Lanka".to_string(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default file (if present) and environment
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(file_config) = Self::from_file("villa-server.toml") {
            config = file_config;
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(addr) = env::var("VILLA_HTTP_ADDR") {
            self.server.http_addr = addr
                .parse()
                .map_err(|e| Error::config(format!("Invalid HTTP address: {}", e)))?;
        }

        if let Ok(data_dir) = env::var("VILLA_DATA_DIR") {
            self.store.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(upload_dir) = env::var("VILLA_UPLOAD_DIR") {
            self.media.upload_dir = PathBuf::from(upload_dir);
        }

        if let Ok(url) = env::var("VILLA_PROCESSOR_URL") {
            self.media.processor_url = Some(url);
        }

        // The AI collaborator honors the conventional variable names
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            self.ai.api_key = key;
        }

        if let Ok(model) = env::var("OPENAI_TEXT_MODEL") {
            let model = model.trim().to_string();
            if !model.is_empty() {
                self.ai.text_model = model;
            }
        }

        if let Ok(base) = env::var("OPENAI_API_BASE") {
            self.ai.api_base = base;
        }

        if let Ok(level) = env::var("VILLA_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.store.db_file.trim().is_empty() {
            return Err(Error::config("Store file name must not be empty"));
        }

        if self.media.max_upload_bytes < 1024 {
            return Err(Error::config("Max upload size too small (minimum 1KB)"));
        }

        if self.ai.max_retries > 5 {
            return Err(Error::config("Too many AI retries (maximum 5)"));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }

        Ok(())
    }

    /// Absolute path of the store's backing file
    pub fn store_path(&self) -> PathBuf {
        self.store.data_dir.join(&self.store.db_file)
    }

    /// Get optimal number of worker threads
    pub fn optimal_worker_threads(&self) -> usize {
        if self.server.worker_threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.server.worker_threads
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.store_path().ends_with("villa-db.json"));
    }

    #[test]
    fn rejects_bad_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml() {
        let parsed: Config = toml::from_str(
            r#"
            [server]
            http_addr = "127.0.0.1:9000"

            [ai]
            property_name = "Test Villa"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.server.http_addr.port(), 9000);
        assert_eq!(parsed.ai.property_name, "Test Villa");
        // Unspecified sections keep their defaults
        assert_eq!(parsed.ai.fallback_model, "gpt-4o-mini");
        assert!(parsed.store.seed_sample);
    }
}
