//! Persisted run-to-run state: the last snapshot and the last time an alert
//! was sent.
//!
//! The core pipeline only talks to the [`StateStore`] trait; the default
//! implementation backs it with two flat files so the state survives between
//! scheduler invocations.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::core::errors::{Result, SvaError};
use crate::status::{ServiceStatus, StatusSnapshot};

/// Textual timestamp format for the last-sent file. Local-time semantics,
/// deliberately not timezone aware.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Load/save operations for the two pieces of persisted state.
pub trait StateStore {
    /// Previous snapshot, or an empty one on first run.
    fn load_snapshot(&self) -> Result<StatusSnapshot>;

    /// Persist the new snapshot, replacing the previous one.
    fn save_snapshot(&self, snapshot: &StatusSnapshot) -> Result<()>;

    /// When the last alert was successfully sent, if ever.
    fn load_last_notified(&self) -> Result<Option<NaiveDateTime>>;

    /// Record a successful send time.
    fn save_last_notified(&self, at: NaiveDateTime) -> Result<()>;
}

/// Flat-file state store: one `name:status` line per service in the snapshot
/// file, a single formatted timestamp in the last-sent file.
pub struct FileStateStore {
    status_file: PathBuf,
    last_email_file: PathBuf,
}

impl FileStateStore {
    #[must_use]
    pub const fn new(status_file: PathBuf, last_email_file: PathBuf) -> Self {
        Self {
            status_file,
            last_email_file,
        }
    }
}

impl StateStore for FileStateStore {
    fn load_snapshot(&self) -> Result<StatusSnapshot> {
        let mut snapshot = StatusSnapshot::new();
        if !self.status_file.exists() {
            debug!(path = %self.status_file.display(), "no previous snapshot");
            return Ok(snapshot);
        }
        let raw = fs::read_to_string(&self.status_file)
            .map_err(|source| SvaError::io(&self.status_file, source))?;
        for line in raw.lines() {
            // Tolerant load: a previously persisted file is best-effort input,
            // lines that no longer parse are dropped rather than fatal.
            let Some((name, status_word)) = line.split_once(':') else {
                continue;
            };
            let Some(status) = ServiceStatus::from_str_opt(status_word.trim()) else {
                continue;
            };
            snapshot.insert(name.trim(), status);
        }
        Ok(snapshot)
    }

    fn save_snapshot(&self, snapshot: &StatusSnapshot) -> Result<()> {
        let mut contents = String::new();
        for entry in snapshot {
            let _ = writeln!(contents, "{}:{}", entry.name, entry.status.as_str());
        }
        fs::write(&self.status_file, contents)
            .map_err(|source| SvaError::io(&self.status_file, source))
    }

    fn load_last_notified(&self) -> Result<Option<NaiveDateTime>> {
        if !self.last_email_file.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.last_email_file)
            .map_err(|source| SvaError::io(&self.last_email_file, source))?;
        // An unparsable timestamp means the throttle state is unknown; treat
        // it as never-notified so a real failure still alerts.
        Ok(NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok())
    }

    fn save_last_notified(&self, at: NaiveDateTime) -> Result<()> {
        fs::write(
            &self.last_email_file,
            at.format(TIMESTAMP_FORMAT).to_string(),
        )
        .map_err(|source| SvaError::io(&self.last_email_file, source))
    }
}
