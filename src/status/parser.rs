//! Parser for the raw status-command output.
//!
//! Each meaningful line looks like `run: nginx: (pid 972) 7s` or
//! `failed: sidekiq: (pid 967) 7s`. The service name is the trimmed second
//! colon-delimited segment; a `run:` prefix means the service is up and any
//! other prefix means it is down.

use crate::core::errors::SvaError;
use crate::status::{ServiceStatus, StatusSnapshot};

/// Result of one parse pass: the snapshot plus the lines that could not be
/// interpreted.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub snapshot: StatusSnapshot,
    /// Malformed lines, kept as errors so the runner can log them. They are
    /// excluded from the snapshot and never abort the run.
    pub malformed: Vec<SvaError>,
}

impl ParseReport {
    /// Failed service names in order of first appearance.
    #[must_use]
    pub fn failed_services(&self) -> Vec<String> {
        self.snapshot.failed_services()
    }
}

/// Parse the raw multi-line status text into a snapshot.
///
/// Blank lines are skipped. A line with fewer than two colon-delimited
/// segments carries no service name; it is recorded in the report and skipped.
#[must_use]
pub fn parse_status_output(raw: &str) -> ParseReport {
    let mut report = ParseReport::default();

    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(name) = service_name(line) else {
            report.malformed.push(SvaError::MalformedStatusLine {
                line_number: index + 1,
                content: line.to_string(),
            });
            continue;
        };

        let status = if line.starts_with("run:") {
            ServiceStatus::Running
        } else {
            ServiceStatus::Failed
        };
        report.snapshot.insert(name, status);
    }

    report
}

/// Trimmed second colon-delimited segment, or `None` when the line has fewer
/// than two colons worth of structure.
fn service_name(line: &str) -> Option<String> {
    let mut segments = line.split(':');
    segments.next()?;
    let name = segments.next()?.trim();
    if name.is_empty() {
        return None;
    }
    Some(name.to_string())
}
