//! Top-level CLI definition and dispatch.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::core::config::Config;
use crate::core::errors::{Result, SvaError};
use crate::notify::mailer::{DryRunMailer, NotificationTransport, SmtpMailer};
use crate::runner;
use crate::source::{CommandSource, FixtureSource, StatusSource};
use crate::state::{FileStateStore, StateStore};

/// svcalert — emails a throttled alert when supervised services fail.
#[derive(Parser)]
#[command(name = "svcalert", version, about)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "svcalert.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Run one monitoring pass: fetch, parse, alert if due, persist.
    Check {
        /// Read the status text from a file instead of running the command.
        #[arg(long)]
        fixture: Option<PathBuf>,
        /// Log the alert instead of delivering it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the last persisted snapshot.
    Status {
        /// Emit JSON instead of plain `name:status` lines.
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved configuration (credential redacted).
    Config,
}

/// Dispatch CLI commands.
///
/// # Errors
/// Returns an error when the configuration cannot be loaded or a `check` run
/// fails fatally; the caller turns that into a non-zero exit.
pub fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;

    match &cli.command {
        Command::Check { fixture, dry_run } => {
            let source: Box<dyn StatusSource> = match fixture {
                Some(path) => Box::new(FixtureSource::new(path.clone())),
                None => Box::new(CommandSource::new(
                    config.source.command.clone(),
                    config.source_timeout(),
                )),
            };
            let transport: Box<dyn NotificationTransport> = if *dry_run {
                Box::new(DryRunMailer)
            } else {
                Box::new(SmtpMailer::from_config(&config))
            };
            let store = file_store(&config);
            let now = chrono::Local::now().naive_local();

            let outcome = runner::run(&config, source.as_ref(), transport.as_ref(), &store, now)?;
            info!(
                services = outcome.snapshot.len(),
                failed = outcome.failed.len(),
                notified = outcome.notified,
                "run complete"
            );
        }
        Command::Status { json } => {
            let store = file_store(&config);
            let snapshot = store.load_snapshot()?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                for entry in &snapshot {
                    println!("{}:{}", entry.name, entry.status.as_str());
                }
            }
        }
        Command::Config => {
            let rendered = toml::to_string_pretty(&config.redacted()).map_err(|err| {
                SvaError::Serialization {
                    context: "toml",
                    details: err.to_string(),
                }
            })?;
            print!("{rendered}");
        }
    }
    Ok(())
}

fn file_store(config: &Config) -> FileStateStore {
    FileStateStore::new(
        config.state.status_file.clone(),
        config.state.last_email_file.clone(),
    )
}
