use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use jobs::PollPolicy;

pub const API_URL_ENV: &str = "EDITVERSE_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const CONFIG_FILE: &str = "config.json";
pub const TOKEN_FILE: &str = "token";
pub const RENDERS_DIR: &str = "renders";

/// Per-user data directory holding config, token and downloaded renders.
pub fn app_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
    base.join("editverse")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub api_base_url: String,
    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,
    pub max_poll_backoff_secs: u64,
    pub request_timeout_secs: Option<u64>,
    pub data_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            poll_interval_secs: 10,
            max_poll_attempts: 180,
            max_poll_backoff_secs: 60,
            request_timeout_secs: None,
            data_dir: None,
        }
    }
}

impl EditorConfig {
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Take `EDITVERSE_API_URL` over whatever the file said.
    pub fn apply_env(self) -> Self {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => self.with_api_url(url.trim()),
            _ => self,
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(app_data_dir)
    }

    pub fn token_path(&self) -> PathBuf {
        self.data_dir().join(TOKEN_FILE)
    }

    pub fn renders_dir(&self) -> PathBuf {
        self.data_dir().join(RENDERS_DIR)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(self.poll_interval_secs.max(1)))
            .with_max_attempts(self.max_poll_attempts.max(1))
            .with_max_backoff(Duration::from_secs(self.max_poll_backoff_secs))
    }

    /// Save configuration to JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Load configuration from JSON
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// `config.json` under `data_dir`, or defaults when there is none.
    /// Unless the file names another directory, everything stays rooted in
    /// `data_dir`.
    pub fn load_or_default(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let config = if path.exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        Ok(match config.data_dir {
            Some(_) => config,
            None => config.with_data_dir(data_dir),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_expectations() {
        let config = EditorConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        let policy = config.poll_policy();
        assert_eq!(policy.interval, Duration::from_secs(10));
        assert_eq!(policy.max_attempts, 180);
        assert_eq!(policy.max_backoff, Duration::from_secs(60));
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::default()
            .with_api_url("https://api.editverse.test")
            .with_timeout(30)
            .with_data_dir(dir.path());
        let path = dir.path().join(CONFIG_FILE);
        config.save(&path).unwrap();

        let loaded = EditorConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.token_path(), dir.path().join("token"));
    }

    #[test]
    fn missing_file_gives_defaults_rooted_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.renders_dir(), dir.path().join("renders"));
        assert_eq!(config.poll_interval_secs, 10);
    }

    #[test]
    fn file_without_data_dir_stays_in_given_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{"poll_interval_secs": 5}"#).unwrap();
        let config = EditorConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.token_path(), dir.path().join(TOKEN_FILE));
        assert_eq!(config.renders_dir(), dir.path().join(RENDERS_DIR));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"poll_interval_secs": 2}"#).unwrap();
        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.max_poll_attempts, 180);
    }
}
