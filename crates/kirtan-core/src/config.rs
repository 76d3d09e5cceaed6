use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Live stream source.  Port 8443 is the stream host's TLS endpoint;
    /// plain-HTTP mirrors exist but are not configured by default.
    #[serde(default = "default_stream_url")]
    pub url: String,
    /// Optional explicit path to the mpv binary; discovered on PATH when
    /// absent.
    #[serde(default)]
    pub mpv_binary: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: default_stream_url(),
            mpv_binary: None,
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
        }
    }
}

fn default_stream_url() -> String {
    "https://live.sgpc.net:8443/;".to_string()
}

fn default_model() -> String {
    crate::assistant::GEMINI_MODEL.to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.stream.url.starts_with("https://live.sgpc.net"));
        assert!(config.stream.mpv_binary.is_none());
        assert_eq!(config.assistant.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[assistant]\nmodel = \"gemini-2.0-flash\"\n").unwrap();
        assert_eq!(config.assistant.model, "gemini-2.0-flash");
        assert!(config.stream.url.starts_with("https://"));
    }
}
