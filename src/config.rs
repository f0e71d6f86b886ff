//! Configuration module for Dostana

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use crate::paths;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Title used when a push payload has none
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Body used when a push payload has none
    #[serde(default = "default_body")]
    pub default_body: String,

    /// Deep link used when a push payload has none
    #[serde(default = "default_url")]
    pub default_url: String,

    /// Icon shown on every notification
    #[serde(default = "default_icon")]
    pub icon: String,

    /// Path the background worker is registered at
    #[serde(default = "default_worker_path")]
    pub worker_path: String,

    /// Scope of the background worker
    #[serde(default = "default_worker_scope")]
    pub worker_scope: String,

    /// VAPID public key (base64url)
    #[serde(default)]
    pub vapid_public_key: String,

    /// Base URL of the push service
    #[serde(default = "default_push_service_url")]
    pub push_service_url: String,

    /// Where the web app is served (relative deep links resolve against it)
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Base URL of the Dostana API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token for API requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// How long a successful operation stays visible
    #[serde(default = "default_success_expiry")]
    pub success_expiry_ms: u64,

    /// How long an alert stays visible
    #[serde(default = "default_alert_timeout")]
    pub alert_timeout_ms: u64,
}

fn default_app_name() -> String {
    "Dostana Notification".to_string()
}

fn default_body() -> String {
    "You have a new message.".to_string()
}

fn default_url() -> String {
    "/".to_string()
}

fn default_icon() -> String {
    "/icons/icon-192x192.png".to_string()
}

fn default_worker_path() -> String {
    "/sw.js".to_string()
}

fn default_worker_scope() -> String {
    "/".to_string()
}

fn default_push_service_url() -> String {
    "http://localhost:8080/push".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_api_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_success_expiry() -> u64 {
    2000
}

fn default_alert_timeout() -> u64 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            default_body: default_body(),
            default_url: default_url(),
            icon: default_icon(),
            worker_path: default_worker_path(),
            worker_scope: default_worker_scope(),
            vapid_public_key: String::new(),
            push_service_url: default_push_service_url(),
            app_url: default_app_url(),
            api_base_url: default_api_base_url(),
            api_token: None,
            success_expiry_ms: default_success_expiry(),
            alert_timeout_ms: default_alert_timeout(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        paths::config_path()
    }

    /// Load config from the default path or create default
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Success expiry as a duration
    pub const fn success_expiry(&self) -> Duration {
        Duration::from_millis(self.success_expiry_ms)
    }

    /// Alert timeout as a duration
    pub const fn alert_timeout(&self) -> Duration {
        Duration::from_millis(self.alert_timeout_ms)
    }
}
