//! Auto-capture classification engine.
//!
//! Decides which tool-execution outcomes deserve to become durable memories:
//!
//! ```text
//! ToolCallRecord ─▶ signature ─▶ PatternStore (count++) ─▶ Outcome
//!                                                          │
//!          FAILURE ─▶ failure memory ─▶ encode             │
//!          NOVEL   ─▶ pattern memory ─▶ encode  ◀──────────┘
//!          REPEATED ─▶ recall (reinforce) or skip
//! ```

mod classifier;
mod content;
mod handler;
mod signature;
mod tracker;
mod warm;

pub use classifier::*;
pub use content::*;
pub use handler::*;
pub use signature::*;
pub use tracker::*;
pub use warm::*;
