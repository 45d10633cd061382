//! Global configuration parsing and validation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// Connection settings for the remote workflow engine.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Base URL of the engine's HTTP API, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Per-request timeout.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

/// Reconciliation loop cadence.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PollConfig {
    /// Delay between the end of one fetch and the start of the next.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

/// Human-in-the-loop gate settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct HitlConfig {
    /// Engine-specific status code that signals a critical halt.
    #[serde(default = "default_critical_halt_status")]
    pub critical_halt_status: String,
}

impl Default for HitlConfig {
    fn default() -> Self {
        Self {
            critical_halt_status: default_critical_halt_status(),
        }
    }
}

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_critical_halt_status() -> String {
    "CRITICAL_HALT".into()
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Workflow engine connection.
    pub engine: EngineConfig,
    /// Poll loop cadence.
    #[serde(default)]
    pub poll: PollConfig,
    /// Decision gate settings.
    #[serde(default)]
    pub hitl: HitlConfig,
    /// Directory for the JSONL log journal; journaling is off when unset.
    #[serde(default)]
    pub journal_dir: Option<PathBuf>,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration for an engine URL with every other value defaulted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the URL fails validation.
    pub fn for_base_url(base_url: impl Into<String>) -> Result<Self> {
        let mut config = Self {
            engine: EngineConfig {
                base_url: base_url.into(),
                request_timeout_seconds: default_request_timeout_seconds(),
            },
            poll: PollConfig::default(),
            hitl: HitlConfig::default(),
            journal_dir: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Interval between poll cycles.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll.interval_ms)
    }

    /// Timeout applied to every engine request.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.engine.request_timeout_seconds)
    }

    fn validate(&mut self) -> Result<()> {
        let base_url = self.engine.base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::Config(
                "engine.base_url must start with http:// or https://".into(),
            ));
        }
        self.engine.base_url = base_url.to_owned();

        if self.engine.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "engine.request_timeout_seconds must be greater than zero".into(),
            ));
        }

        if self.poll.interval_ms == 0 {
            return Err(AppError::Config(
                "poll.interval_ms must be greater than zero".into(),
            ));
        }

        let halt = self.hitl.critical_halt_status.trim();
        if halt.is_empty() {
            return Err(AppError::Config(
                "hitl.critical_halt_status must not be empty".into(),
            ));
        }
        self.hitl.critical_halt_status = halt.to_owned();

        Ok(())
    }
}
