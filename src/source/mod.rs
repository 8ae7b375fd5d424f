//! Status sources: where the raw service-status text comes from.
//!
//! The runner only sees the [`StatusSource`] trait; production uses
//! [`CommandSource`], tests and the `--fixture` flag use [`FixtureSource`].

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, bounded};
use tracing::debug;

use crate::core::errors::{Result, SvaError};

/// Produces the raw status text for one run.
pub trait StatusSource {
    /// Fetch the current status text. Any error here is fatal for the run.
    fn fetch(&self) -> Result<String>;

    /// Human-readable identifier for log lines.
    fn describe(&self) -> String;
}

/// Runs a shell command and captures its stdout.
///
/// The wait is bounded: the command runs on a worker thread and the fetch
/// fails with a timeout error if it does not complete in time. A timed-out
/// command is abandoned, not killed; the next scheduled run starts fresh.
pub struct CommandSource {
    command: String,
    timeout: Duration,
}

impl CommandSource {
    #[must_use]
    pub const fn new(command: String, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    fn fetch_error(&self, details: impl Into<String>) -> SvaError {
        SvaError::Fetch {
            command: self.command.clone(),
            details: details.into(),
        }
    }
}

impl StatusSource for CommandSource {
    fn fetch(&self) -> Result<String> {
        debug!(command = %self.command, "running status command");
        let command = self.command.clone();
        let (sender, receiver) = bounded(1);

        thread::spawn(move || {
            let output = Command::new("sh").arg("-c").arg(&command).output();
            // The receiver may have timed out and gone away.
            let _ = sender.send(output);
        });

        let output = match receiver.recv_timeout(self.timeout) {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(self.fetch_error(format!("failed to execute: {source}")));
            }
            Err(RecvTimeoutError::Timeout) => {
                return Err(self.fetch_error(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(self.fetch_error("status worker thread exited unexpectedly"));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.fetch_error(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| self.fetch_error("stdout was not valid UTF-8"))
    }

    fn describe(&self) -> String {
        format!("command `{}`", self.command)
    }
}

/// Reads the status text from a file. Mirrors the original sample-output
/// testing mode and backs the `check --fixture` flag.
pub struct FixtureSource {
    path: PathBuf,
}

impl FixtureSource {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StatusSource for FixtureSource {
    fn fetch(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|source| SvaError::Fetch {
            command: format!("fixture {}", self.path.display()),
            details: source.to_string(),
        })
    }

    fn describe(&self) -> String {
        format!("fixture {}", self.path.display())
    }
}
