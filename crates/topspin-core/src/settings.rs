//! Persisted CLI settings with environment fallback for the API key.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ingest::{PollConfig, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL};

/// Environment variables consulted when no key is configured, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Settings stored at the config path as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Gemini API key (environment variables take over when unset)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Pinned analysis model; None means auto-select from the catalog
    #[serde(default)]
    pub model: Option<String>,

    /// Seconds between readiness polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Wall-clock budget in seconds for the readiness wait
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    /// Custom coaching instructions replacing the built-in prompt
    #[serde(default)]
    pub prompt: Option<String>,
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_max_wait_secs() -> u64 {
    DEFAULT_MAX_WAIT.as_secs()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            poll_interval_secs: default_poll_interval_secs(),
            max_wait_secs: default_max_wait_secs(),
            prompt: None,
        }
    }
}

impl Settings {
    /// Settings file location (e.g. ~/.config/topspin/settings.json).
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("topspin")
            .join("settings.json")
    }

    /// Load settings from the config path, using defaults when the file is
    /// missing or malformed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                crate::verbose!("Ignoring malformed settings file: {e}");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist settings to the config path, creating parent directories.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    /// The configured key, or the first non-empty API key environment
    /// variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key_with(self.api_key.as_deref(), |var| std::env::var(var).ok())
    }

    /// Polling parameters as a [`PollConfig`].
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_wait: Duration::from_secs(self.max_wait_secs),
        }
    }
}

fn resolve_api_key_with(
    configured: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    if let Some(key) = configured {
        if !key.is_empty() {
            return Some(key.to_string());
        }
    }
    API_KEY_ENV_VARS
        .iter()
        .find_map(|var| lookup(var).filter(|value| !value.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_polling_constants() {
        let settings = Settings::default();
        assert!(settings.api_key.is_none());
        assert!(settings.model.is_none());
        assert_eq!(settings.poll_interval_secs, 2);
        assert_eq!(settings.max_wait_secs, 120);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.api_key = Some("AIzaTest123".to_string());
        settings.model = Some("models/gemini-1.5-pro".to_string());
        settings.max_wait_secs = 240;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded.api_key.as_deref(), Some("AIzaTest123"));
        assert_eq!(loaded.model.as_deref(), Some("models/gemini-1.5-pro"));
        assert_eq!(loaded.poll_interval_secs, 2);
        assert_eq!(loaded.max_wait_secs, 240);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load_from(&dir.path().join("absent.json"));
        assert!(loaded.api_key.is_none());
        assert_eq!(loaded.poll_interval_secs, 2);
    }

    #[test]
    fn test_load_malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let loaded = Settings::load_from(&path);
        assert!(loaded.api_key.is_none());
        assert_eq!(loaded.max_wait_secs, 120);
    }

    #[test]
    fn test_partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"api_key": "AIzaOnlyKey"}"#).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded.api_key.as_deref(), Some("AIzaOnlyKey"));
        assert_eq!(loaded.poll_interval_secs, 2);
        assert_eq!(loaded.max_wait_secs, 120);
        assert!(loaded.prompt.is_none());
    }

    #[test]
    fn test_configured_key_wins_over_environment() {
        let resolved = resolve_api_key_with(Some("AIzaConfigured"), |_| {
            Some("AIzaFromEnv".to_string())
        });
        assert_eq!(resolved.as_deref(), Some("AIzaConfigured"));
    }

    #[test]
    fn test_empty_configured_key_falls_back_to_environment() {
        let resolved = resolve_api_key_with(Some(""), |var| match var {
            "GEMINI_API_KEY" => Some("AIzaFromEnv".to_string()),
            _ => None,
        });
        assert_eq!(resolved.as_deref(), Some("AIzaFromEnv"));
    }

    #[test]
    fn test_environment_variables_checked_in_order() {
        let resolved = resolve_api_key_with(None, |var| match var {
            "GEMINI_API_KEY" => Some("AIzaGemini".to_string()),
            "GOOGLE_API_KEY" => Some("AIzaGoogle".to_string()),
            _ => None,
        });
        assert_eq!(resolved.as_deref(), Some("AIzaGemini"));

        let google_only = resolve_api_key_with(None, |var| match var {
            "GOOGLE_API_KEY" => Some("AIzaGoogle".to_string()),
            _ => None,
        });
        assert_eq!(google_only.as_deref(), Some("AIzaGoogle"));
    }

    #[test]
    fn test_no_key_anywhere_resolves_to_none() {
        assert!(resolve_api_key_with(None, |_| None).is_none());
        assert!(resolve_api_key_with(Some(""), |_| None).is_none());
    }

    #[test]
    fn test_poll_config_conversion() {
        let mut settings = Settings::default();
        settings.poll_interval_secs = 5;
        settings.max_wait_secs = 300;

        let poll = settings.poll_config();
        assert_eq!(poll.interval, Duration::from_secs(5));
        assert_eq!(poll.max_wait, Duration::from_secs(300));
    }
}
