//! Configuration management for askcmd.
//!
//! Configuration is loaded from `~/.config/askcmd/config.toml`. Every field
//! has a default, so a missing file or a partial file is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model to ask (default: qwen2.5-coder:3b).
    #[serde(default = "default_model")]
    pub model: String,
    /// Ollama host URL (default: http://localhost:11434).
    #[serde(default = "default_host")]
    pub host: String,
    /// Ollama executable name or path (default: ollama).
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Sampling temperature for generation (default: 0.2).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Timeout for the API liveness probe, in seconds (default: 3).
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Timeout for the generate request, in seconds (default: 120).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Who the commands are for, as stated to the model.
    #[serde(default = "default_system_context")]
    pub system_context: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            host: default_host(),
            binary: default_binary(),
            temperature: default_temperature(),
            probe_timeout_secs: default_probe_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            system_context: default_system_context(),
        }
    }
}

fn default_model() -> String {
    "qwen2.5-coder:3b".to_string()
}

fn default_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_binary() -> String {
    "ollama".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_probe_timeout_secs() -> u64 {
    3
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_system_context() -> String {
    "Fedora 42 user and not root".to_string()
}

impl Config {
    /// Get the config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("askcmd"))
            .context("Could not determine config directory")
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location, using defaults if not found.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, using defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// URL answered by a running Ollama server.
    pub fn tags_url(&self) -> String {
        format!("{}/api/tags", self.host.trim_end_matches('/'))
    }

    /// URL of the non-chat completion endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.host.trim_end_matches('/'))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
