//! moodcheck configuration
//!
//! Layered the same way everywhere: built-in defaults, then an optional
//! TOML file, then environment variables, then explicit overrides from the
//! caller (CLI flags).

use crate::error::SurveyError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`SurveyConfig::api_base_url`]
pub const ENV_API_URL: &str = "MOODCHECK_API_URL";

/// Environment variable overriding [`SurveyConfig::data_dir`]
pub const ENV_DATA_DIR: &str = "MOODCHECK_DATA_DIR";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Base URL of the remote survey API (no trailing `/api`)
    pub api_base_url: String,
    /// Directory holding the local fallback store
    pub data_dir: PathBuf,
    /// Per-operation remote deadlines
    pub timeouts: RemoteTimeouts,
}

impl SurveyConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With API base URL
    #[inline]
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// With local data directory
    #[inline]
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// With remote timeouts
    #[inline]
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: RemoteTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Parse a TOML document; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns [`SurveyError::ConfigError`] on malformed TOML.
    pub fn from_toml_str(source: &str) -> Result<Self, SurveyError> {
        toml::from_str(source).map_err(|e| SurveyError::ConfigError(e.to_string()))
    }

    /// Load a TOML file
    ///
    /// # Errors
    /// Returns [`SurveyError::ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SurveyError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            SurveyError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    #[must_use]
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000".to_string(),
            data_dir: PathBuf::from(".moodcheck"),
            timeouts: RemoteTimeouts::default(),
        }
    }
}

/// Deadlines for each remote operation, in milliseconds
///
/// Submitting an answer has the shortest bound since it runs once per
/// question; the admin report has the longest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteTimeouts {
    /// `POST /api/login`
    pub create_profile_ms: u64,
    /// `POST /api/response`
    pub submit_response_ms: u64,
    /// `GET /api/admin/responses`
    pub fetch_report_ms: u64,
}

impl RemoteTimeouts {
    /// Same deadline for every operation (mostly for tests)
    #[inline]
    #[must_use]
    pub fn uniform(ms: u64) -> Self {
        Self {
            create_profile_ms: ms,
            submit_response_ms: ms,
            fetch_report_ms: ms,
        }
    }

    /// Profile creation deadline
    #[inline]
    #[must_use]
    pub fn create_profile(&self) -> Duration {
        Duration::from_millis(self.create_profile_ms)
    }

    /// Answer submission deadline
    #[inline]
    #[must_use]
    pub fn submit_response(&self) -> Duration {
        Duration::from_millis(self.submit_response_ms)
    }

    /// Report fetch deadline
    #[inline]
    #[must_use]
    pub fn fetch_report(&self) -> Duration {
        Duration::from_millis(self.fetch_report_ms)
    }
}

impl Default for RemoteTimeouts {
    fn default() -> Self {
        Self {
            create_profile_ms: 1500,
            submit_response_ms: 800,
            fetch_report_ms: 2000,
        }
    }
}
