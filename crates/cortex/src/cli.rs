//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Cortex - workspace knowledge migration for the memory gateway
#[derive(Parser, Debug)]
#[command(name = "cortex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract facts from workspace markdown and encode them as memories
    Migrate(MigrateArgs),

    /// Check configuration and gateway connectivity
    Doctor,

    /// Show version information
    Version,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migrate
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug, Clone, Default)]
pub struct MigrateArgs {
    /// Workspace directory (defaults to the current directory)
    pub workspace: Option<PathBuf>,

    /// Migrate a single file instead of a whole workspace
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Memory gateway URL (overrides config and BRAINDB_URL)
    #[arg(long, value_name = "URL")]
    pub braindb: Option<String>,

    /// Extract and report facts without encoding them
    #[arg(long)]
    pub dry_run: bool,

    /// Only list migratable files
    #[arg(long, conflicts_with = "dry_run")]
    pub scan: bool,

    /// List every extracted fact
    #[arg(short, long)]
    pub verbose: bool,

    /// Delegate extraction to the configured text-generation service
    #[arg(long, conflicts_with = "no_swarm")]
    pub swarm: bool,

    /// Force local extraction even if swarm is enabled in config
    #[arg(long)]
    pub no_swarm: bool,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}

impl MigrateArgs {
    /// Swarm override from flags, if any.
    pub fn swarm_override(&self) -> Option<bool> {
        match (self.swarm, self.no_swarm) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
