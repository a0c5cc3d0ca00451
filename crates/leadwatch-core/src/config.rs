//! Leadwatch configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{LeadwatchError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadwatchConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl LeadwatchConfig {
    /// Load config from the default path (~/.leadwatch/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LeadwatchError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| LeadwatchError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| LeadwatchError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Leadwatch home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".leadwatch")
    }
}

/// Admin API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Session token. Usually supplied at login rather than stored.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String { "http://127.0.0.1:8080/api".into() }
fn default_timeout_secs() -> u64 { 15 }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Polling cadences and batch sizes for the notifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_reminder_refresh")]
    pub reminder_refresh_secs: u64,
    #[serde(default = "default_reminder_check")]
    pub reminder_check_secs: u64,
    #[serde(default = "default_reminder_window")]
    pub reminder_window_limit: usize,
    #[serde(default = "default_lead_poll")]
    pub lead_poll_secs: u64,
    #[serde(default = "default_lead_page")]
    pub lead_page_size: usize,
    #[serde(default = "default_badge_poll")]
    pub badge_poll_secs: u64,
    #[serde(default = "default_badge_limit")]
    pub badge_count_limit: usize,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "bool_true")]
    pub sound: bool,
}

fn bool_true() -> bool { true }
fn default_reminder_refresh() -> u64 { 60 }
fn default_reminder_check() -> u64 { 100 }
fn default_reminder_window() -> usize { 50 }
fn default_lead_poll() -> u64 { 20 }
fn default_lead_page() -> usize { 20 }
fn default_badge_poll() -> u64 { 60 }
fn default_badge_limit() -> usize { 1000 }
fn default_history_limit() -> usize { 100 }

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            reminder_refresh_secs: default_reminder_refresh(),
            reminder_check_secs: default_reminder_check(),
            reminder_window_limit: default_reminder_window(),
            lead_poll_secs: default_lead_poll(),
            lead_page_size: default_lead_page(),
            badge_poll_secs: default_badge_poll(),
            badge_count_limit: default_badge_limit(),
            history_limit: default_history_limit(),
            sound: true,
        }
    }
}

impl NotifyConfig {
    pub fn reminder_refresh_every(&self) -> Duration {
        secs(self.reminder_refresh_secs)
    }

    pub fn reminder_check_every(&self) -> Duration {
        secs(self.reminder_check_secs)
    }

    pub fn lead_poll_every(&self) -> Duration {
        secs(self.lead_poll_secs)
    }

    pub fn badge_poll_every(&self) -> Duration {
        secs(self.badge_poll_secs)
    }
}

// A zero period would make tokio::time::interval panic.
fn secs(n: u64) -> Duration {
    Duration::from_secs(n.max(1))
}
