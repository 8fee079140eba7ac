//! Core types for the camscan camera scanning component.
//!
//! This crate holds the pieces shared by every other camscan crate and has
//! no I/O of its own:
//!
//! - [`ScannerState`]: the single authoritative scanner state and its
//!   transition table.
//! - [`ScannerConfig`]: timing and policy knobs, loadable from JSON.
//! - [`constants`]: default timings and heuristics vocabulary.
//! - [`Error`]: state and configuration errors.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::ScannerConfig;
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
