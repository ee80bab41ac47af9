//! Provider configuration (`config.toml`)
//!
//! ```toml
//! host = "http://localhost:19090"
//! username = "education"
//! password = "test123"
//! jobs = 4
//!
//! [retry]
//! max_attempts = 3
//! base_delay_ms = 500
//! backoff_factor = 2.0
//! ```
//!
//! `HASHICUPS_HOST`, `HASHICUPS_USERNAME` and `HASHICUPS_PASSWORD` (or the
//! matching CLI flags) take precedence over the file.

use anyhow::{Context, Result, bail};
use hashicups_client::{CoffeeApi, Credentials, HttpBackend, MemoryBackend, RetryConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::paths;

/// Returned when required settings are absent from both file and environment
#[derive(Debug, thiserror::Error)]
#[error(
    "missing configuration: {}. Set them in {} or via HASHICUPS_* environment variables",
    .keys.join(", "),
    .file
)]
pub struct MissingSettings {
    pub keys: Vec<&'static str>,
    pub file: String,
}

#[derive(Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub jobs: Option<usize>,
    pub retry: RetrySettings,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("jobs", &self.jobs)
            .field("retry", &self.retry)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            backoff_factor: 2.0,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> Result<RetryConfig> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            bail!(
                "retry.backoff_factor must be a finite number of at least 1.0, got {}",
                self.backoff_factor
            );
        }
        Ok(RetryConfig::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            self.backoff_factor,
        ))
    }
}

/// Settings given on the command line or through the environment
#[derive(Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Config {
    /// Load `config.toml` from the config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    /// Load a config file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if overrides.host.is_some() {
            self.host = overrides.host;
        }
        if overrides.username.is_some() {
            self.username = overrides.username;
        }
        if overrides.password.is_some() {
            self.password = overrides.password;
        }
        self
    }

    /// Keys that must be set before talking to a live API
    pub fn missing(&self, needs_credentials: bool) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(self.host.as_deref()) {
            missing.push("host");
        }
        if needs_credentials {
            if is_blank(self.username.as_deref()) {
                missing.push("username");
            }
            if is_blank(self.password.as_deref()) {
                missing.push("password");
            }
        }
        missing
    }

    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }

    /// Build the API backend; `offline` serves an in-memory HashiCups
    pub fn backend(&self, offline: bool, needs_credentials: bool) -> Result<Arc<dyn CoffeeApi>> {
        if offline {
            log::info!("Using in-memory HashiCups backend");
            return Ok(Arc::new(MemoryBackend::new()));
        }

        let missing = self.missing(needs_credentials);
        if !missing.is_empty() {
            let file = paths::config_file()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "config.toml".to_string());
            return Err(MissingSettings {
                keys: missing,
                file,
            }
            .into());
        }

        let host = self.host.as_deref().unwrap_or_default();
        log::debug!("Using HashiCups API at {host}");
        let retry = self.retry.to_retry_config()?;
        Ok(Arc::new(
            HttpBackend::new(host, self.credentials()).with_retry(retry),
        ))
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
