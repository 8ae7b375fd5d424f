//! TOML configuration loaded once at startup and passed explicitly into the
//! runner. No ambient global state.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SvaError};

/// Alert recipients, sender identity, and SMTP endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Primary recipient list (`To`). Must be non-empty.
    pub to: Vec<String>,
    /// Secondary recipient list (`Cc`). May be empty.
    #[serde(default)]
    pub cc: Vec<String>,
    /// Sender address, also used as the SMTP auth username.
    pub from: String,
    /// Display name attached to the sender address.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// SMTP auth credential for the sender.
    pub password: String,
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Fixed subject line for every alert.
    #[serde(default = "default_subject")]
    pub subject: String,
}

/// The external command that reports service states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Shell command whose stdout is the raw status text.
    pub command: String,
    /// Upper bound on how long one fetch may take.
    #[serde(default = "default_source_timeout_secs")]
    pub timeout_secs: u64,
}

/// Where the snapshot and last-sent timestamp are persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_status_file")]
    pub status_file: PathBuf,
    #[serde(default = "default_last_email_file")]
    pub last_email_file: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            status_file: default_status_file(),
            last_email_file: default_last_email_file(),
        }
    }
}

/// Alert throttling and delivery tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Minimum interval between consecutive alerts while failures persist.
    #[serde(default = "default_throttle_secs")]
    pub throttle_secs: u64,
    /// Connection timeout for the SMTP session.
    #[serde(default = "default_smtp_timeout_secs")]
    pub smtp_timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            throttle_secs: default_throttle_secs(),
            smtp_timeout_secs: default_smtp_timeout_secs(),
        }
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub email: EmailConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

fn default_from_name() -> String {
    "Service Monitor".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_subject() -> String {
    "Service alert".to_string()
}

const fn default_source_timeout_secs() -> u64 {
    30
}

fn default_status_file() -> PathBuf {
    PathBuf::from("/tmp/svcalert_service_status.cache")
}

fn default_last_email_file() -> PathBuf {
    PathBuf::from("/tmp/svcalert_last_email_sent.cache")
}

const fn default_throttle_secs() -> u64 {
    3600
}

const fn default_smtp_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SvaError::MissingConfig {
                path: path.to_path_buf(),
            });
        }
        let raw = fs::read_to_string(path).map_err(|source| SvaError::io(path, source))?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from an in-memory TOML string. Used by tests and `config` dispatch.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.email.to.iter().all(|addr| addr.trim().is_empty()) {
            return Err(invalid("email.to must list at least one recipient"));
        }
        if self.email.from.trim().is_empty() {
            return Err(invalid("email.from must not be empty"));
        }
        if self.email.smtp_server.trim().is_empty() {
            return Err(invalid("email.smtp_server must not be empty"));
        }
        if self.source.command.trim().is_empty() {
            return Err(invalid("source.command must not be empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(invalid("source.timeout_secs must be positive"));
        }
        if TimeDelta::from_std(self.throttle_window()).is_err() {
            return Err(invalid("notify.throttle_secs is out of range"));
        }
        Ok(())
    }

    /// Throttle window as a duration.
    #[must_use]
    pub const fn throttle_window(&self) -> Duration {
        Duration::from_secs(self.notify.throttle_secs)
    }

    /// Fetch timeout as a duration.
    #[must_use]
    pub const fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_secs)
    }

    /// Copy with the SMTP credential blanked, safe for printing.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.email.password = "<redacted>".to_string();
        copy
    }
}

fn invalid(details: &str) -> SvaError {
    SvaError::InvalidConfig {
        details: details.to_string(),
    }
}
