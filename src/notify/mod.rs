//! Alerting: throttle decision, message composition, SMTP delivery.

pub mod mailer;
pub mod throttle;
