mod check;
mod cli;
mod codec;
mod config;
mod error;
mod fixture;
mod model;
mod output;
mod progress;
mod protocol;
mod tables;
mod transport;

use anyhow::Context;
use clap::Parser;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

pub fn run() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    init_logging(args.verbose);
    let settings = args.settings();
    let backend = transport::make_backend(args.fixture.clone(), &settings)?;

    cli::dispatch(args, &settings, &*backend).context("command failed")
}

fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Only fails if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .try_init();
}
