//! mapquery CLI - headless front end for spatial queries against a feature backend

mod cli;
mod commands;
mod config_loader;
mod errors;
mod export;
mod map;
mod output;
mod output_types;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    let runtime = tokio::runtime::Runtime::new()?;

    if let Err(e) = runtime.block_on(commands::execute(cli)) {
        errors::report(&e, json);
        std::process::exit(1);
    }

    Ok(())
}
