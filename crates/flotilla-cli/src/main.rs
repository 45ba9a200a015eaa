//! `flotilla` command-line host for the dashboard session layer.
mod bootstrap;
mod cli_args;
mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::bootstrap::init_tracing;
use crate::cli_args::Cli;
use crate::commands::run_cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    run_cli(cli).await
}
