//! Error types for the cortex CLI.

use thiserror::Error;

/// Errors that end a command with a non-zero exit.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Memory gateway unreachable at {url}: {reason}")]
    GatewayUnreachable { url: String, reason: String },

    #[error("Failed to build extractor: {0}")]
    Extractor(String),
}
