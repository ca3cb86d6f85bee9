use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_FOFA_BASE_URL: &str = "https://fofa.info";
pub const DEFAULT_QUAKE_BASE_URL: &str = "https://quake.360.net";

/// Settings for one scan run. Built once and never changed afterwards.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub fofa_email: String,
    pub fofa_key: String,
    pub quake_api_key: String,
    pub fofa_base_url: String,
    pub quake_base_url: String,
    /// Size of the worker pool
    pub max_workers: usize,
    /// Minimum seconds between two calls to the same source
    pub api_delay: f64,
    pub max_retries: u32,
    /// Fixed pause in seconds between attempts
    pub retry_delay: f64,
    /// Failed attempts after which a source is disabled for the run
    pub max_api_failures: u32,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
    pub page_size: u32,
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .max(4)
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            fofa_email: String::new(),
            fofa_key: String::new(),
            quake_api_key: String::new(),
            fofa_base_url: DEFAULT_FOFA_BASE_URL.to_string(),
            quake_base_url: DEFAULT_QUAKE_BASE_URL.to_string(),
            max_workers: default_workers(),
            api_delay: 1.0,
            max_retries: 3,
            retry_delay: 5.0,
            max_api_failures: 5,
            request_timeout: 30,
            page_size: 100,
        }
    }
}

impl ScannerConfig {
    /// Defaults overlaid with `FOFA_EMAIL`, `FOFA_KEY`, `QUAKE_API_KEY` and
    /// the optional base URL overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        if let Some(v) = var("FOFA_EMAIL") {
            config.fofa_email = v;
        }
        if let Some(v) = var("FOFA_KEY") {
            config.fofa_key = v;
        }
        if let Some(v) = var("QUAKE_API_KEY") {
            config.quake_api_key = v;
        }
        if let Some(v) = var("FOFA_BASE_URL") {
            config.fofa_base_url = v;
        }
        if let Some(v) = var("QUAKE_BASE_URL") {
            config.quake_base_url = v;
        }
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fofa_email.trim().is_empty() {
            return Err(ConfigError::MissingCredential("FOFA_EMAIL"));
        }
        if self.fofa_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential("FOFA_KEY"));
        }
        if self.quake_api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential("QUAKE_API_KEY"));
        }
        if self.max_workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        for (field, value) in [("api_delay", self.api_delay), ("retry_delay", self.retry_delay)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid { field, reason: format!("{} is not a non-negative number of seconds", value) });
            }
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::Invalid { field: "request_timeout", reason: "must be at least 1 second".into() });
        }
        Ok(())
    }

    pub fn api_delay(&self) -> Duration {
        secs(self.api_delay)
    }

    pub fn retry_delay(&self) -> Duration {
        secs(self.retry_delay)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

fn secs(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() { "<unset>" } else { "<redacted>" }
}

impl fmt::Debug for ScannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScannerConfig")
            .field("fofa_email", &self.fofa_email)
            .field("fofa_key", &redact(&self.fofa_key))
            .field("quake_api_key", &redact(&self.quake_api_key))
            .field("fofa_base_url", &self.fofa_base_url)
            .field("quake_base_url", &self.quake_base_url)
            .field("max_workers", &self.max_workers)
            .field("api_delay", &self.api_delay)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("max_api_failures", &self.max_api_failures)
            .field("request_timeout", &self.request_timeout)
            .field("page_size", &self.page_size)
            .finish()
    }
}
