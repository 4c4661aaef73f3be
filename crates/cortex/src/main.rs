//! cortex - workspace knowledge migration CLI
//!
//! Turns workspace markdown (MEMORY.md, USER.md, daily notes, ...) into
//! atomic facts and encodes them into the memory gateway.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod error;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; migrate --verbose raises the default level
    let level = match &cli.command {
        Commands::Migrate(args) if args.verbose => "debug",
        _ => "warn",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive(format!("cortex={}", level).parse()?)
                .add_directive(format!("cortex_core={}", level).parse()?),
        )
        .init();

    // Load configuration
    let config = cortex_core::Config::load()?;

    // Execute command
    match cli.command {
        Commands::Migrate(args) => commands::migrate::execute(args, config).await,
        Commands::Doctor => commands::doctor::execute(&config).await,
        Commands::Version => {
            println!("cortex {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
