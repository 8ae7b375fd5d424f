//! Alert composition and SMTP delivery.

#![allow(missing_docs)]

use std::time::Duration;

use chrono::NaiveDateTime;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::core::config::{Config, EmailConfig};
use crate::core::errors::{Result, SvaError};
use crate::state::TIMESTAMP_FORMAT;

/// A composed alert, ready for any transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

impl AlertMessage {
    /// Compose the alert for the current failed set.
    ///
    /// The body names each failed service under a timestamped header so the
    /// email is self-contained even when it arrives late.
    #[must_use]
    pub fn compose(failed: &[String], subject: &str, now: NaiveDateTime) -> Self {
        let timestamp = now.format(TIMESTAMP_FORMAT);
        let mut body = format!("The following supervised services are DOWN as of {timestamp}:\n\n");
        for service in failed {
            body.push_str("- ");
            body.push_str(service);
            body.push('\n');
        }
        body.push_str("\nPlease check the server.\n");
        Self {
            subject: subject.to_string(),
            body,
        }
    }
}

/// Delivery capability for a composed alert. One attempt per run, no retry.
pub trait NotificationTransport {
    fn send(&self, message: &AlertMessage) -> Result<()>;

    /// Whether an accepted message counts as a real delivery. Transports that
    /// only log (dry runs) return false so the last-sent timestamp stays
    /// untouched and a later real run is not throttled.
    fn commits_send(&self) -> bool {
        true
    }
}

/// SMTP delivery: STARTTLS upgrade, credential auth, To + Cc recipients.
pub struct SmtpMailer {
    email: EmailConfig,
    timeout: Duration,
}

impl SmtpMailer {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            email: config.email.clone(),
            timeout: Duration::from_secs(config.notify.smtp_timeout_secs),
        }
    }

    fn build_message(&self, message: &AlertMessage) -> Result<Message> {
        let from: Mailbox = format!("{} <{}>", self.email.from_name, self.email.from)
            .parse()
            .map_err(|err| transport_error(format!("invalid sender address: {err}")))?;

        let mut builder = Message::builder().from(from).subject(&message.subject);
        for recipient in &self.email.to {
            builder = builder.to(parse_mailbox(recipient)?);
        }
        for recipient in &self.email.cc {
            builder = builder.cc(parse_mailbox(recipient)?);
        }

        builder
            .body(message.body.clone())
            .map_err(|err| transport_error(format!("could not build message: {err}")))
    }
}

impl NotificationTransport for SmtpMailer {
    fn send(&self, message: &AlertMessage) -> Result<()> {
        let email = self.build_message(message)?;

        let credentials =
            Credentials::new(self.email.from.clone(), self.email.password.clone());
        let mailer = SmtpTransport::starttls_relay(&self.email.smtp_server)
            .map_err(|err| transport_error(format!("SMTP relay setup failed: {err}")))?
            .port(self.email.smtp_port)
            .credentials(credentials)
            .timeout(Some(self.timeout))
            .build();

        mailer
            .send(&email)
            .map_err(|err| transport_error(format!("send failed: {err}")))?;
        Ok(())
    }
}

/// Transport used by `check --dry-run`: logs the alert instead of sending it.
pub struct DryRunMailer;

impl NotificationTransport for DryRunMailer {
    fn send(&self, message: &AlertMessage) -> Result<()> {
        info!(subject = %message.subject, "dry run, alert not sent:\n{}", message.body);
        Ok(())
    }

    fn commits_send(&self) -> bool {
        false
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|err| transport_error(format!("invalid recipient {address:?}: {err}")))
}

fn transport_error(details: String) -> SvaError {
    SvaError::Transport { details }
}
