//! The database handle shared by the inserter and the queries.

use log::info;
use sqlx::AnyPool;

use crate::config::TOP_DOMAINS_LIMIT;
use crate::error_handling::DatabaseError;
use crate::storage::insert::{insert_batch, BatchSummary};
use crate::storage::queries::{top_domains, TopDomain};
use crate::storage::queue::RecordReceiver;
use crate::storage::tables::LogTable;

/// An open, reachable database.
///
/// Only the connector creates a `LogStore`, and only after the server
/// answered a probe. Cloning is cheap: clones share one connection pool, so
/// the handle can be passed to concurrent tasks.
#[derive(Debug, Clone)]
pub struct LogStore {
    pool: AnyPool,
}

impl LogStore {
    pub(crate) fn new(pool: AnyPool) -> Self {
        LogStore { pool }
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Drains `records` into `table` in one transaction.
    ///
    /// See [`insert_batch`] for the contract.
    pub async fn insert_batch(
        &self,
        table: LogTable,
        records: &mut RecordReceiver,
        num_values: usize,
    ) -> Result<BatchSummary, DatabaseError> {
        insert_batch(self, table, records, num_values).await
    }

    /// The `limit` most queried domains in the `dns` table.
    pub async fn top_domains(&self, limit: u32) -> Result<Vec<TopDomain>, DatabaseError> {
        top_domains(self, limit).await
    }

    /// The five most queried domains in the `dns` table.
    pub async fn top_five_domains(&self) -> Result<Vec<TopDomain>, DatabaseError> {
        top_domains(self, TOP_DOMAINS_LIMIT).await
    }

    /// Returns true once [`LogStore::close`] was called on any clone.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Closes every connection, waiting for checked-out ones to be returned.
    pub async fn close(self) {
        self.pool.close().await;
        info!("Database connections closed");
    }
}
