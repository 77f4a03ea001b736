//! Configuration management for pinboard.
//!
//! Loads configuration from ${PINBOARD_HOME}/config.toml with sensible
//! defaults. `PINBOARD_BASE_URL` overrides the configured backend URL.

use std::fs;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::paths::config_path;

/// Client configuration for the hosted message-board backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the backend (auth, rows, objects, change feed).
    pub base_url: String,
    /// Public API key sent as the `apikey` header on every request.
    pub anon_key: String,
    /// Object storage bucket holding post attachments.
    pub bucket: String,
    /// Table name for post rows.
    pub posts_table: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            anon_key: String::new(),
            bucket: "images".to_string(),
            posts_table: "posts".to_string(),
        }
    }
}

impl Config {
    /// Loads the config file, applying env overrides.
    ///
    /// A missing file yields defaults; `PINBOARD_BASE_URL` wins over the
    /// file's `base_url`.
    pub fn load() -> Result<Self> {
        let path = config_path();

        let mut config: Config = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Config::default()
        };

        if let Ok(base_url) = std::env::var("PINBOARD_BASE_URL") {
            config.base_url = base_url;
        }

        // Normalize: URL derivations join with '/'.
        while config.base_url.ends_with('/') {
            config.base_url.pop();
        }

        if !config.base_url.is_empty() {
            url::Url::parse(&config.base_url)
                .with_context(|| format!("Invalid base_url: {}", config.base_url))?;
        }

        Ok(config)
    }

    /// Validates that the config is complete enough to reach a backend.
    pub fn require_backend(&self) -> Result<()> {
        if self.base_url.is_empty() {
            bail!(
                "No backend configured.\n\
                 Set base_url in {} or export PINBOARD_BASE_URL.",
                config_path().display()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    use crate::test_env;

    fn setup_temp_home() -> TempDir {
        let temp = TempDir::new().unwrap();
        // SAFETY: Callers hold the env lock, serializing variable access
        unsafe {
            std::env::set_var("PINBOARD_HOME", temp.path());
            std::env::remove_var("PINBOARD_BASE_URL");
        }
        temp
    }

    #[test]
    fn test_load_defaults_when_missing() {
        let _env = test_env::lock();
        let _temp = setup_temp_home();

        let config = Config::load().unwrap();
        assert_eq!(config.base_url, "");
        assert_eq!(config.bucket, "images");
        assert_eq!(config.posts_table, "posts");
        assert!(config.require_backend().is_err());
    }

    #[test]
    fn test_load_reads_file_and_trims_trailing_slash() {
        let _env = test_env::lock();
        let temp = setup_temp_home();

        fs::write(
            temp.path().join("config.toml"),
            "base_url = \"http://127.0.0.1:9999/\"\nanon_key = \"anon\"\n",
        )
        .unwrap();

        let config = Config::load().unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9999");
        assert_eq!(config.anon_key, "anon");
        // Unspecified fields keep defaults
        assert_eq!(config.bucket, "images");
        assert!(config.require_backend().is_ok());
    }

    #[test]
    fn test_env_overrides_file() {
        let _env = test_env::lock();
        let temp = setup_temp_home();

        fs::write(
            temp.path().join("config.toml"),
            "base_url = \"http://127.0.0.1:1111\"\n",
        )
        .unwrap();
        unsafe {
            std::env::set_var("PINBOARD_BASE_URL", "http://127.0.0.1:2222");
        }

        let config = Config::load().unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:2222");

        unsafe {
            std::env::remove_var("PINBOARD_BASE_URL");
        }
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let _env = test_env::lock();
        let temp = setup_temp_home();

        fs::write(
            temp.path().join("config.toml"),
            "base_url = \"not a url\"\n",
        )
        .unwrap();

        assert!(Config::load().is_err());
    }
}
