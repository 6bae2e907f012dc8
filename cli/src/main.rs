//! `dongle`: fuzzy directory jumping for the shell.
//!
//! `dongle pick` prints the chosen directory on stdout for a shell function to
//! `cd` into. Exit status is 0 when a directory was chosen, 1 when the picker
//! was cancelled and 2 on any failure.

mod args;
mod commands;
mod init;

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::args::Cli;

/// Log filter directives, e.g. `DONGLE_LOG=dongle_index=debug`.
const LOG_VAR: &str = "DONGLE_LOG";

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match commands::run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("dongle: {err:#}");
            ExitCode::from(commands::FAILURE)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}
