//! Binary entry point: logging setup, CLI parse, dispatch, exit code.

use clap::Parser;
use tracing::error;

use svcalert::cli_app::{self, Cli};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("svcalert=info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = cli_app::run(&cli) {
        error!(code = err.code(), "{err}");
        std::process::exit(1);
    }
}
