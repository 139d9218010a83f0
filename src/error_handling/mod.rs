//! Error handling.
//!
//! This module provides:
//! - Error type definitions for initialization and database operations
//! - Classification of retryable connection errors
//! - Retry strategy configuration

mod categorization;
mod types;

// Re-export public API
pub use categorization::{backoff_delay, get_retry_strategy, is_connection_refused};
pub use types::{DatabaseError, InitializationError};
