//! Error type definitions.
//!
//! This module defines the error types used throughout the crate.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for database operations.
///
/// Connection failures come in three flavours: `Configuration` (bad
/// arguments, never retried), `Timeout` (the server kept refusing
/// connections until the retry budget ran out) and `SqlError` (anything else
/// the driver reported, passed through untouched).
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Malformed connection parameters.
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// The server refused every connection attempt.
    #[error("Connection to database timed out after {attempts} attempts")]
    Timeout {
        /// Number of probes made before giving up
        attempts: usize,
    },

    /// SQL or driver error, surfaced verbatim.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Table name outside the set of known log tables.
    #[error("Unknown log table: {0:?}")]
    UnknownTable(String),

    /// A batch insert was asked for zero fields per record.
    #[error("Invalid field count {0}: records need at least one field")]
    InvalidFieldCount(usize),

    /// A record did not have the expected number of fields.
    #[error("Record {position} has {actual} fields, expected {expected}")]
    FieldCount {
        /// 1-based position of the record in the batch
        position: usize,
        /// Field count the insert statement was prepared for
        expected: usize,
        /// Field count of the offending record
        actual: usize,
    },

    /// The receiving side of a record queue is gone.
    #[error("Record queue is closed")]
    QueueClosed,

    /// The producer aborted the queue; the batch must not be committed.
    #[error("Record producer failed: {0}")]
    ProducerFailed(String),

    /// Reading producer input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatabaseError {
    /// Returns the underlying driver error, if any.
    pub fn as_sqlx(&self) -> Option<&sqlx::Error> {
        match self {
            DatabaseError::SqlError(e) => Some(e),
            _ => None,
        }
    }
}
