//! Command implementations.

pub mod doctor;
pub mod migrate;
