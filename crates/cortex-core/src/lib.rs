//! cortex-core - Core library for Cortex
//!
//! Decides what is worth remembering for an agent and hands it to an external
//! memory gateway:
//!
//! - **capture**: auto-capture classification of tool-call outcomes
//! - **extract**: markdown fact extraction, dedup and shard assignment
//! - **migrate**: workspace discovery and batch migration
//! - **gateway**: the memory gateway interface and its HTTP client
//! - **config**: layered configuration

pub mod capture;
pub mod config;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod migrate;
pub mod text;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use gateway::MemoryGateway;
pub use types::{CandidateFact, CandidateMemory, FileDescriptor, FileType, Shard, ToolCallRecord};

#[cfg(feature = "client")]
pub use gateway::HttpGateway;
