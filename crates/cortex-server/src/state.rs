//! Application state.

use cortex_core::capture::CaptureHandler;
use cortex_core::Config;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<Config>,
    /// Capture pipeline (classifier, pattern store, gateway)
    pub capture: CaptureHandler,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config, capture: CaptureHandler) -> Self {
        Self {
            config: Arc::new(config),
            capture,
            start_time: Instant::now(),
        }
    }
}
