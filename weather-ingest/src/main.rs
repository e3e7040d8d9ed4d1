//! Binary crate for the `weather-ingest` tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging setup (stderr, so stdout carries only the invocation summary)
//! - Operator helpers around the core invocation

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
