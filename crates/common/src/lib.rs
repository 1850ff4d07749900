//! scrubkit common utilities
//!
//! Shared infrastructure for all scrubkit crates:
//! - Error taxonomy and result alias
//! - Tracing/logging initialization
//! - Configuration loading (playback defaults, tutorial storage, asset locations)

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
