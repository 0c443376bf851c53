//! Brokkr CLI - addon package manager for the panel
//!
//! This is the main entry point for the brokkr command-line interface.

mod cli;
mod commands;
mod output;
mod version;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let panel = cli.panel.as_deref();

    match cli.command {
        Commands::Install(args) => commands::install::run(args, panel).await,
        Commands::Remove(args) => commands::remove::run(args, panel).await,
        Commands::Upgrade(args) => commands::upgrade::run(args, panel).await,
        Commands::List(args) => commands::list::run(args, panel),
        Commands::Inspect(args) => commands::inspect::run(args, panel),
        Commands::Bundle(args) => commands::bundle::run(args),
        Commands::Rebuild(args) => commands::rebuild::run(args, panel).await,
        Commands::Version(args) => commands::version::run(args),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
