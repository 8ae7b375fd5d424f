//! One monitoring pass: load state, fetch, parse, decide, notify, persist.
//!
//! The pipeline is strictly linear. Only a fetch failure aborts the run;
//! every later failure is logged and the run continues so the persisted
//! state still reflects reality for the next invocation.

use chrono::{NaiveDateTime, TimeDelta};
use tracing::{error, info, warn};

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::notify::mailer::{AlertMessage, NotificationTransport};
use crate::notify::throttle::should_notify;
use crate::source::StatusSource;
use crate::state::StateStore;
use crate::status::parser::parse_status_output;
use crate::status::{ServiceStatus, StatusSnapshot};

/// What one run observed and did. Returned to the CLI layer for reporting.
#[derive(Debug)]
pub struct RunOutcome {
    /// The new snapshot, as persisted.
    pub snapshot: StatusSnapshot,
    /// Failed service names in order of first appearance.
    pub failed: Vec<String>,
    /// Whether an alert was handed to the transport and accepted.
    pub notified: bool,
    /// Status lines that could not be parsed this run.
    pub malformed_lines: usize,
}

/// Execute one monitoring pass.
///
/// `now` is injected by the caller; nothing below this function reads the
/// system clock, which keeps the throttle decision testable.
pub fn run(
    config: &Config,
    source: &dyn StatusSource,
    transport: &dyn NotificationTransport,
    store: &dyn StateStore,
    now: NaiveDateTime,
) -> Result<RunOutcome> {
    // Loaded. Prior state is best-effort input: a corrupt or unreadable file
    // must not stop a run that could still alert on a real outage.
    let previous = match store.load_snapshot() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(code = err.code(), "could not load previous snapshot: {err}");
            StatusSnapshot::new()
        }
    };
    let last_notified = match store.load_last_notified() {
        Ok(last) => last,
        Err(err) => {
            warn!(code = err.code(), "could not load last-sent timestamp: {err}");
            None
        }
    };

    // Fetched. No snapshot can be computed without the source, so this is the
    // one fatal step.
    info!(source = %source.describe(), "checking service status");
    let raw = source.fetch()?;

    // Parsed.
    let report = parse_status_output(&raw);
    for issue in &report.malformed {
        warn!(code = issue.code(), "{issue}");
    }
    let failed = report.failed_services();
    log_transitions(&previous, &report.snapshot);

    // Decided.
    let window = TimeDelta::from_std(config.throttle_window()).unwrap_or(TimeDelta::MAX);
    let notify = should_notify(&failed, last_notified, now, window);

    // Notified. The send is committed the moment the transport accepts it;
    // later persistence failures never undo it.
    let mut notified = false;
    if notify {
        info!(failed = %failed.join(", "), "sending alert email");
        let message = AlertMessage::compose(&failed, &config.email.subject, now);
        match transport.send(&message) {
            Ok(()) => {
                notified = true;
                // Only a real delivery moves the throttle state forward; a
                // dry run must not suppress the next genuine alert.
                if transport.commits_send() {
                    info!("alert sent");
                    if let Err(err) = store.save_last_notified(now) {
                        error!(code = err.code(), "could not record send time: {err}");
                    }
                }
            }
            Err(err) => {
                error!(code = err.code(), "alert delivery failed: {err}");
            }
        }
    } else if failed.is_empty() {
        info!("all services are running");
    } else {
        warn!(
            failed = %failed.join(", "),
            "alert already sent within the last hour"
        );
    }

    // Persisted.
    if let Err(err) = store.save_snapshot(&report.snapshot) {
        error!(code = err.code(), "could not persist snapshot: {err}");
    }

    Ok(RunOutcome {
        snapshot: report.snapshot,
        failed,
        notified,
        malformed_lines: report.malformed.len(),
    })
}

/// Log services that changed state since the previous run. Services may
/// appear or disappear between runs; only name overlap is compared.
fn log_transitions(previous: &StatusSnapshot, current: &StatusSnapshot) {
    for entry in current {
        match previous.get(&entry.name) {
            Some(before) if before != entry.status => match entry.status {
                ServiceStatus::Failed => {
                    warn!(service = %entry.name, "service went down");
                }
                ServiceStatus::Running => {
                    info!(service = %entry.name, "service recovered");
                }
            },
            _ => {}
        }
    }
}
