//! Configuration management for the API client

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default API origin; override with the `SEONGKEUM_API` environment variable
pub const DEFAULT_API_BASE: &str = "https://api.seongkeum.com";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL that relative request paths are joined onto
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Path of the SSE chat endpoint
    pub stream_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_secs: 30,
            stream_path: "/api/chat/stream".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from default location or create default
    ///
    /// `SEONGKEUM_API` overrides the configured base URL either way.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            ClientConfig::default()
        };

        if let Ok(base) = std::env::var("SEONGKEUM_API") {
            if !base.trim().is_empty() {
                config.base_url = base;
            }
        }

        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "seongkeum") {
            let config_dir = proj_dirs.config_dir();
            std::fs::create_dir_all(config_dir)?;
            Ok(config_dir.join("client.toml"))
        } else {
            Ok(PathBuf::from("client.toml"))
        }
    }

    /// Save configuration to default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_BASE);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.stream_path, "/api/chat/stream");
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: ClientConfig = toml::from_str("base_url = \"http://localhost:8080\"").unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ClientConfig {
            base_url: "https://staging.example.com".to_string(),
            timeout_secs: 10,
            stream_path: "/api/chat/stream".to_string(),
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let back: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.base_url, config.base_url);
        assert_eq!(back.timeout_secs, 10);
    }
}
