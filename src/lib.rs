//! svcalert: single-pass service-status monitor with throttled email alerts.
//!
//! Each invocation (typically from cron) loads the previously persisted
//! state, fetches and parses the current service statuses, decides whether an
//! alert is due, optionally delivers it over SMTP, and persists the new
//! snapshot. See the module docs for the individual stages.

pub mod cli_app;
pub mod core;
pub mod notify;
pub mod runner;
pub mod source;
pub mod state;
pub mod status;
