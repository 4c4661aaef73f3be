//! Workspace migration: discovery, scan and the per-file pipeline.

mod discovery;
mod pipeline;

pub use discovery::*;
pub use pipeline::*;
