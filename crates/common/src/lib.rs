//! Stepclip Common Utilities
//!
//! Shared infrastructure for all Stepclip crates:
//! - Error types and result aliases
//! - Clock and tick pacing for simulated playback
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
