//! Error types for cortex-core.

use thiserror::Error;

/// Result type alias using cortex-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for capture and migration operations
#[derive(Error, Debug)]
pub enum Error {
    // Gateway errors
    #[error("Memory gateway unreachable: {0}")]
    GatewayUnreachable(String),

    #[error("Memory gateway error ({status}): {message}")]
    Gateway { status: u16, message: String },

    #[error("Request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[cfg(feature = "client")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Text generation errors
    #[error("Text generation failed: {0}")]
    Generator(String),

    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a gateway error from a status code and response body
    pub fn gateway(status: u16, message: impl Into<String>) -> Self {
        Self::Gateway {
            status,
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if the gateway could not be reached at all
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::GatewayUnreachable(_))
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
