//! Server configuration.

use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Settings {
    /// Path to configuration file
    pub config_path: PathBuf,
    /// Listen address for the capture endpoint
    pub bind: SocketAddr,
    /// Shared configuration (gateway, capture thresholds)
    pub core: cortex_core::Config,
}

impl Settings {
    /// Load configuration from file, environment and defaults
    ///
    /// ```text
    /// ~/.cortex/              ($CORTEX_DIR)
    /// └── config.toml         # [gateway] [capture] [server] ...
    /// ```
    pub fn load() -> anyhow::Result<Self> {
        let config_path = cortex_core::Config::default_path();
        let core = cortex_core::Config::load()
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
        Self::from_core(config_path, core)
    }

    pub fn from_core(config_path: PathBuf, core: cortex_core::Config) -> anyhow::Result<Self> {
        let bind = core
            .server
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address: {}", core.server.bind))?;
        Ok(Self {
            config_path,
            bind,
            core,
        })
    }
}
