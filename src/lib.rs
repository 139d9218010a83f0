//! dns_logstore library: streaming log inserts into a relational database
//!
//! This library connects to a MySQL (or SQLite) database with bounded retry,
//! drains queued log records into a table inside a single transaction, and
//! reports the most frequently queried domains.
//!
//! # Example
//!
//! ```no_run
//! use dns_logstore::{connect, record_channel, ConnectionConfig, LogTable};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConnectionConfig::new("logger", "secret", "127.0.0.1", "3306", "logs");
//! let store = connect(&config).await?;
//!
//! let (sender, mut records) = record_channel(128);
//! tokio::spawn(async move {
//!     let _ = sender
//!         .send(vec!["1704067200.1", "example.com", "93.184.216.34"])
//!         .await;
//! });
//!
//! let summary = store.insert_batch(LogTable::Dns, &mut records, 3).await?;
//! println!("inserted {} records", summary.inserted);
//!
//! for domain in store.top_five_domains().await? {
//!     println!("{} {}", domain.query, domain.count);
//! }
//! store.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod config;
mod error_handling;
pub mod ingest;
pub mod initialization;
mod storage;

// Re-export public API
pub use config::{Config, ConnectionConfig, LogFormat, LogLevel, RetryPolicy};
pub use error_handling::{is_connection_refused, DatabaseError, InitializationError};
pub use storage::{
    connect, connect_url, connect_url_with_policy, connect_with_policy, insert_batch,
    record_channel, retry_probe, top_domains, unbounded_record_channel, BatchSummary, LogRecord,
    LogStore, LogTable, RecordReceiver, RecordSender, TopDomain,
};
