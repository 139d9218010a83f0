// storage/mod.rs
// Database operations module

pub mod connector;
pub mod insert;
pub mod queries;
pub mod queue;
pub mod store;
pub mod tables;
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use connector::{connect, connect_url, connect_url_with_policy, connect_with_policy, retry_probe};
pub use insert::{insert_batch, BatchSummary};
pub use queries::{top_domains, TopDomain};
pub use queue::{record_channel, unbounded_record_channel, LogRecord, RecordReceiver, RecordSender};
pub use store::LogStore;
pub use tables::LogTable;
