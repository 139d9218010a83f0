//! Configuration constants.
//!
//! This module defines the defaults used throughout the crate: the connection
//! retry budget, queue sizing and the aggregation limit.

use std::time::Duration;

// Connection retry strategy
/// Maximum number of connection probes (including the initial attempt).
/// Set to 7 = initial probe + 6 retries.
pub const CONNECT_MAX_ATTEMPTS: usize = 7;
/// Base delay between connection probes.
/// The delay before retry `n` is `n * CONNECT_BASE_DELAY` (1s, 2s, ... 6s = 21s total).
pub const CONNECT_BASE_DELAY: Duration = Duration::from_secs(1);

// Record queue
/// Default capacity of the bounded record queue.
/// Producers wait once this many records are pending.
pub const RECORD_QUEUE_CAPACITY: usize = 1024;
/// Default separator between fields of an ingested log line (Zeek TSV).
pub const DEFAULT_FIELD_SEPARATOR: char = '\t';
/// Default number of fields expected per ingested record.
pub const DEFAULT_FIELD_COUNT: usize = 3;

// Aggregation
/// Number of rows returned by the top domains query.
pub const TOP_DOMAINS_LIMIT: u32 = 5;

// Connection defaults (used when the environment does not provide a value)
/// Default database user
pub const DEFAULT_DB_USER: &str = "root";
/// Default database host
pub const DEFAULT_DB_HOST: &str = "127.0.0.1";
/// Default MySQL port
pub const DEFAULT_DB_PORT: &str = "3306";
/// Default database name
pub const DEFAULT_DB_NAME: &str = "logs";
