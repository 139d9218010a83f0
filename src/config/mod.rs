//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (retry budget, queue sizing, limits)
//! - Connection, retry and logging configuration types

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, ConnectionConfig, LogFormat, LogLevel, RetryPolicy};
