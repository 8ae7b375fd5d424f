//! Alert throttling: at most one email per window while failures persist.

use chrono::{NaiveDateTime, TimeDelta};

/// Decide whether an alert should go out this run.
///
/// True iff the failed set is non-empty and either no alert was ever sent or
/// the last one is strictly older than the window. Exactly one window apart
/// does not trigger. Pure function of its inputs; callers inject `now`.
#[must_use]
pub fn should_notify(
    failed: &[String],
    last_notified: Option<NaiveDateTime>,
    now: NaiveDateTime,
    window: TimeDelta,
) -> bool {
    if failed.is_empty() {
        return false;
    }
    match last_notified {
        None => true,
        Some(last) => now.signed_duration_since(last) > window,
    }
}
