//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! `API_BASE_URL` and `TOKEN_FILE` override their file counterparts.

use serde::Deserialize;
use session_client::ClientSettings;
use session_store::{DEFAULT_LOGOUT_COOLDOWN_MS, DEFAULT_REFRESH_PATH, DEFAULT_SUCCESS_STATUS};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Upstream API settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_success_status")]
    pub success_status: String,
}

/// Token persistence and logout settings
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    #[serde(default = "default_logout_cooldown")]
    pub logout_cooldown_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
            logout_cooldown_ms: default_logout_cooldown(),
        }
    }
}

fn default_refresh_path() -> String {
    DEFAULT_REFRESH_PATH.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_success_status() -> String {
    DEFAULT_SUCCESS_STATUS.to_string()
}

fn default_token_file() -> PathBuf {
    PathBuf::from("session-token.json")
}

fn default_logout_cooldown() -> u64 {
    DEFAULT_LOGOUT_COOLDOWN_MS
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Ok(url) = std::env::var("API_BASE_URL") {
            config.api.base_url = url;
        }
        if let Ok(file) = std::env::var("TOKEN_FILE") {
            config.session.token_file = PathBuf::from(file);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(common::Error::invalid(
                "api.base_url",
                format!("must start with http:// or https://, got: {}", self.api.base_url),
            ));
        }

        if !self.api.refresh_path.starts_with('/') {
            return Err(common::Error::invalid(
                "api.refresh_path",
                format!("must start with '/', got: {}", self.api.refresh_path),
            ));
        }

        if self.api.timeout_secs == 0 {
            return Err(common::Error::invalid(
                "api.timeout_secs",
                "must be greater than 0",
            ));
        }

        if self.api.success_status.trim().is_empty() {
            return Err(common::Error::invalid(
                "api.success_status",
                "must not be empty",
            ));
        }

        if self.session.logout_cooldown_ms == 0 {
            return Err(common::Error::invalid(
                "session.logout_cooldown_ms",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Settings handed to the request pipeline.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            refresh_path: self.api.refresh_path.clone(),
            success_status: self.api.success_status.clone(),
            logout_cooldown: Duration::from_millis(self.session.logout_cooldown_ms),
        }
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("session-cli.toml")
    }
}
