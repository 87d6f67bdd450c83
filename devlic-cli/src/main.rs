//! devlic license tool
//!
//! Issues and validates device-bound licenses from the command line.
//!
//! Usage:
//!   devlic keygen
//!   devlic fingerprint
//!   devlic issue --fingerprint <FP> --unit month --period 1
//!   devlic validate <LICENSE>
//!
//! Logs go to stderr; license text and reports go to stdout.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use devlic_cli::{run, Args};
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_ascii_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    let stdout = io::stdout();
    match run(args, &mut stdout.lock()) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
