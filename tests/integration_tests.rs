//! End-to-end runs through the library API: raw status text in, persisted
//! state and (mock) alert deliveries out.

use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use tempfile::TempDir;

use svcalert::core::config::Config;
use svcalert::core::errors::{Result, SvaError};
use svcalert::notify::mailer::{AlertMessage, DryRunMailer, NotificationTransport};
use svcalert::runner;
use svcalert::source::StatusSource;
use svcalert::state::{FileStateStore, StateStore};
use svcalert::status::ServiceStatus;

const MIXED_STATUS: &str = "run: nginx: (pid 1) 1s\nfailed: sidekiq: (pid 2) 1s\n";
const ALL_RUNNING: &str = "run: nginx: (pid 1) 1s\nrun: sidekiq: (pid 2) 1s\n";

/// In-memory status source, standing in for the external command.
struct TextSource(&'static str);

impl StatusSource for TextSource {
    fn fetch(&self) -> Result<String> {
        Ok(self.0.to_string())
    }

    fn describe(&self) -> String {
        "test text".to_string()
    }
}

/// Status source that always fails, like an absent status command.
struct BrokenSource;

impl StatusSource for BrokenSource {
    fn fetch(&self) -> Result<String> {
        Err(SvaError::Fetch {
            command: "broken".to_string(),
            details: "command not found".to_string(),
        })
    }

    fn describe(&self) -> String {
        "broken source".to_string()
    }
}

/// Records delivered alerts; optionally refuses every send.
#[derive(Default)]
struct MockTransport {
    sent: Mutex<Vec<AlertMessage>>,
    fail: bool,
}

impl MockTransport {
    fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().expect("lock").len()
    }
}

impl NotificationTransport for MockTransport {
    fn send(&self, message: &AlertMessage) -> Result<()> {
        if self.fail {
            return Err(SvaError::Transport {
                details: "connection refused".to_string(),
            });
        }
        self.sent.lock().expect("lock").push(message.clone());
        Ok(())
    }
}

struct Harness {
    _dir: TempDir,
    config: Config,
    store: FileStateStore,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let config = Config::from_toml(&format!(
            r#"
            [email]
            to = ["ops@example.com"]
            cc = ["oncall@example.com"]
            from = "monitor@example.com"
            password = "hunter2"
            smtp_server = "smtp.example.com"

            [source]
            command = "true"

            [state]
            status_file = "{status}"
            last_email_file = "{last}"
            "#,
            status = dir.path().join("status.cache").display(),
            last = dir.path().join("last_email.cache").display(),
        ))
        .expect("test config should parse");
        let store = FileStateStore::new(
            config.state.status_file.clone(),
            config.state.last_email_file.clone(),
        );
        Self {
            _dir: dir,
            config,
            store,
        }
    }
}

fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 8, 29)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid timestamp")
}

#[test]
fn first_failure_sends_alert_and_persists_state() {
    let harness = Harness::new();
    let transport = MockTransport::default();

    let outcome = runner::run(
        &harness.config,
        &TextSource(MIXED_STATUS),
        &transport,
        &harness.store,
        noon(),
    )
    .expect("run should complete");

    assert_eq!(outcome.failed, ["sidekiq"]);
    assert!(outcome.notified);
    assert_eq!(transport.sent_count(), 1);
    {
        let sent = transport.sent.lock().expect("lock");
        assert!(sent[0].body.contains("- sidekiq"));
        assert!(sent[0].body.contains("2026-08-29 12:00:00"));
    }

    let snapshot = harness.store.load_snapshot().expect("load");
    assert_eq!(snapshot.get("nginx"), Some(ServiceStatus::Running));
    assert_eq!(snapshot.get("sidekiq"), Some(ServiceStatus::Failed));
    assert_eq!(
        harness.store.load_last_notified().expect("load"),
        Some(noon())
    );
}

#[test]
fn recent_alert_suppresses_send_but_snapshot_still_updates() {
    let harness = Harness::new();
    let transport = MockTransport::default();
    let ten_minutes_ago = noon() - TimeDelta::minutes(10);
    harness
        .store
        .save_last_notified(ten_minutes_ago)
        .expect("seed timestamp");

    let outcome = runner::run(
        &harness.config,
        &TextSource(MIXED_STATUS),
        &transport,
        &harness.store,
        noon(),
    )
    .expect("run should complete");

    assert!(!outcome.notified);
    assert_eq!(transport.sent_count(), 0);
    // Throttled, so the send time is untouched.
    assert_eq!(
        harness.store.load_last_notified().expect("load"),
        Some(ten_minutes_ago)
    );
    // But the snapshot still reflects the latest observation.
    let snapshot = harness.store.load_snapshot().expect("load");
    assert_eq!(snapshot.get("sidekiq"), Some(ServiceStatus::Failed));
}

#[test]
fn all_running_never_notifies() {
    let harness = Harness::new();
    let transport = MockTransport::default();
    // Even with a stale throttle state, a clean fleet sends nothing.
    harness
        .store
        .save_last_notified(noon() - TimeDelta::days(2))
        .expect("seed timestamp");

    let outcome = runner::run(
        &harness.config,
        &TextSource(ALL_RUNNING),
        &transport,
        &harness.store,
        noon(),
    )
    .expect("run should complete");

    assert!(outcome.failed.is_empty());
    assert!(!outcome.notified);
    assert_eq!(transport.sent_count(), 0);
    let snapshot = harness.store.load_snapshot().expect("load");
    assert!(
        snapshot
            .iter()
            .all(|entry| entry.status == ServiceStatus::Running)
    );
}

#[test]
fn delivery_failure_keeps_timestamp_and_still_persists_snapshot() {
    let harness = Harness::new();
    let transport = MockTransport::failing();
    let two_hours_ago = noon() - TimeDelta::hours(2);
    harness
        .store
        .save_last_notified(two_hours_ago)
        .expect("seed timestamp");

    let outcome = runner::run(
        &harness.config,
        &TextSource(MIXED_STATUS),
        &transport,
        &harness.store,
        noon(),
    )
    .expect("delivery failure must not abort the run");

    assert!(!outcome.notified);
    // The failed send leaves the throttle state as it was.
    assert_eq!(
        harness.store.load_last_notified().expect("load"),
        Some(two_hours_ago)
    );
    // The new snapshot is still written.
    let snapshot = harness.store.load_snapshot().expect("load");
    assert_eq!(snapshot.get("sidekiq"), Some(ServiceStatus::Failed));
}

#[test]
fn fetch_failure_is_fatal_and_leaves_state_alone() {
    let harness = Harness::new();
    let transport = MockTransport::default();

    let err = runner::run(
        &harness.config,
        &BrokenSource,
        &transport,
        &harness.store,
        noon(),
    )
    .expect_err("fetch failure must abort the run");

    assert_eq!(err.code(), "SVA-2001");
    assert_eq!(transport.sent_count(), 0);
    assert!(harness.store.load_snapshot().expect("load").is_empty());
}

#[test]
fn malformed_lines_are_counted_but_do_not_abort() {
    let harness = Harness::new();
    let transport = MockTransport::default();
    let raw: &'static str = "run: nginx: (pid 1) 1s\nnot a status line\n";

    let outcome = runner::run(
        &harness.config,
        &TextSource(raw),
        &transport,
        &harness.store,
        noon(),
    )
    .expect("run should complete");

    assert_eq!(outcome.malformed_lines, 1);
    assert_eq!(outcome.snapshot.len(), 1);
    assert!(!outcome.notified);
}

#[test]
fn dry_run_leaves_throttle_state_untouched() {
    let harness = Harness::new();

    let outcome = runner::run(
        &harness.config,
        &TextSource(MIXED_STATUS),
        &DryRunMailer,
        &harness.store,
        noon(),
    )
    .expect("dry run should complete");

    // The alert was composed and accepted, but nothing was delivered, so the
    // send time must not be recorded.
    assert!(outcome.notified);
    assert!(harness.store.load_last_notified().expect("load").is_none());

    // A real run minutes later still alerts; the rehearsal did not consume
    // the throttle window.
    let transport = MockTransport::default();
    let outcome = runner::run(
        &harness.config,
        &TextSource(MIXED_STATUS),
        &transport,
        &harness.store,
        noon() + TimeDelta::minutes(10),
    )
    .expect("real run should complete");

    assert!(outcome.notified);
    assert_eq!(transport.sent_count(), 1);
    assert_eq!(
        harness.store.load_last_notified().expect("load"),
        Some(noon() + TimeDelta::minutes(10))
    );
}

#[test]
fn unwritable_state_paths_do_not_abort_or_roll_back_the_send() {
    let dir = TempDir::new().expect("tempdir");
    // Both state files live under a directory that does not exist, so every
    // write fails while the loads still report clean first-run state.
    let config = Config::from_toml(&format!(
        r#"
        [email]
        to = ["ops@example.com"]
        from = "monitor@example.com"
        password = "hunter2"
        smtp_server = "smtp.example.com"

        [source]
        command = "true"

        [state]
        status_file = "{status}"
        last_email_file = "{last}"
        "#,
        status = dir.path().join("missing").join("status.cache").display(),
        last = dir.path().join("missing").join("last_email.cache").display(),
    ))
    .expect("test config should parse");
    let store = FileStateStore::new(
        config.state.status_file.clone(),
        config.state.last_email_file.clone(),
    );
    let transport = MockTransport::default();

    let outcome = runner::run(&config, &TextSource(MIXED_STATUS), &transport, &store, noon())
        .expect("persistence failures must not abort the run");

    // The send happened and stays committed even though neither the send
    // time nor the snapshot could be written afterwards.
    assert!(outcome.notified);
    assert_eq!(transport.sent_count(), 1);
    assert!(store.load_last_notified().expect("load").is_none());
    assert!(store.load_snapshot().expect("load").is_empty());
}

#[test]
fn repeated_run_past_window_alerts_again() {
    let harness = Harness::new();
    let transport = MockTransport::default();

    runner::run(
        &harness.config,
        &TextSource(MIXED_STATUS),
        &transport,
        &harness.store,
        noon(),
    )
    .expect("first run");
    assert_eq!(transport.sent_count(), 1);

    // Within the window: suppressed.
    runner::run(
        &harness.config,
        &TextSource(MIXED_STATUS),
        &transport,
        &harness.store,
        noon() + TimeDelta::minutes(59),
    )
    .expect("second run");
    assert_eq!(transport.sent_count(), 1);

    // Strictly past the window: alerts again.
    let later = noon() + TimeDelta::hours(1) + TimeDelta::seconds(1);
    runner::run(
        &harness.config,
        &TextSource(MIXED_STATUS),
        &transport,
        &harness.store,
        later,
    )
    .expect("third run");
    assert_eq!(transport.sent_count(), 2);
    assert_eq!(
        harness.store.load_last_notified().expect("load"),
        Some(later)
    );
}
