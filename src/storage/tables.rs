//! Known log tables.
//!
//! Table names cannot be bound as statement parameters, so they are
//! interpolated into SQL text. Only names from this fixed set ever reach a
//! statement.

use std::str::FromStr;

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::error_handling::DatabaseError;

/// Destination table for a batch of log records (one per Zeek log type).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, Display, EnumIter, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogTable {
    /// DNS queries (`dns`); the table the top domains query reads
    Dns,
    /// Connection summaries (`conn`)
    Conn,
    /// HTTP requests (`http`)
    Http,
    /// TLS handshakes (`ssl`)
    Ssl,
    /// File transfers (`files`)
    Files,
}

impl LogTable {
    /// Validates a caller-supplied table name against the allow-list.
    ///
    /// Matching is exact: `"DNS"` or `"dns "` are rejected.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::UnknownTable` for any other name.
    pub fn parse(name: &str) -> Result<Self, DatabaseError> {
        LogTable::from_str(name).map_err(|_| DatabaseError::UnknownTable(name.to_string()))
    }

    /// SQL identifier of the table.
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    /// Builds the positional insert statement for `num_values` columns.
    pub(crate) fn insert_statement(&self, num_values: usize) -> String {
        let placeholders = vec!["?"; num_values].join(", ");
        format!("INSERT INTO {} VALUES ({})", self.as_str(), placeholders)
    }
}
