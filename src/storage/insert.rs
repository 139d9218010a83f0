//! Streaming batch insert.
//!
//! Every record popped from the queue is inserted through one prepared
//! statement inside one transaction. The batch is all-or-nothing: the first
//! failure rolls everything back and the remaining records are left unread.
//! An aborted queue counts as a failure; only a cleanly closed one commits.

use log::{debug, error, info, warn};
use serde::Serialize;
use sqlx::{Any, Executor, Statement, Transaction};

use crate::error_handling::DatabaseError;
use crate::storage::queue::RecordReceiver;
use crate::storage::store::LogStore;
use crate::storage::tables::LogTable;

/// Outcome of a committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Table the batch was written to
    pub table: LogTable,
    /// Number of rows committed
    pub inserted: usize,
}

/// Inserts every record from `records` into `table` within one transaction.
///
/// The statement is prepared once with `num_values` positional placeholders
/// and every field is bound as a string. Records are inserted in the order
/// they are popped; the call returns once the queue is closed and drained,
/// waiting on it while it is empty.
///
/// # Errors
///
/// - `DatabaseError::InvalidFieldCount` if `num_values` is 0 (nothing is touched)
/// - `DatabaseError::SqlError` if the transaction cannot start, the statement
///   cannot be prepared (the queue is left unread), a row fails to insert, or
///   the commit fails
/// - `DatabaseError::FieldCount` if a record does not have `num_values` fields
/// - `DatabaseError::ProducerFailed` if a producer aborted the queue
///
/// On any error after the transaction started, it is rolled back and no row
/// of the batch is visible.
pub async fn insert_batch(
    store: &LogStore,
    table: LogTable,
    records: &mut RecordReceiver,
    num_values: usize,
) -> Result<BatchSummary, DatabaseError> {
    if num_values == 0 {
        return Err(DatabaseError::InvalidFieldCount(num_values));
    }

    let sql = table.insert_statement(num_values);
    let mut tx = store.pool().begin().await.map_err(|e| {
        error!("Failed to begin transaction for {table}: {e}");
        DatabaseError::SqlError(e)
    })?;

    let statement = match (&mut *tx).prepare(sql.as_str()).await {
        Ok(statement) => statement,
        Err(e) => {
            error!("Failed to prepare insert into {table}: {e}");
            rollback(tx, table).await;
            return Err(DatabaseError::SqlError(e));
        }
    };

    let mut inserted = 0;
    loop {
        let record = match records.pop().await {
            Ok(Some(record)) => record,
            Ok(None) => break,
            Err(e) => {
                error!("Input for {table} failed after {inserted} records: {e}");
                rollback(tx, table).await;
                return Err(e);
            }
        };
        let position = inserted + 1;
        if record.len() != num_values {
            error!(
                "Record {position} for {table} has {} fields, expected {num_values}",
                record.len()
            );
            rollback(tx, table).await;
            return Err(DatabaseError::FieldCount {
                position,
                expected: num_values,
                actual: record.len(),
            });
        }

        let query = record
            .into_fields()
            .into_iter()
            .fold(statement.query(), |query, field| query.bind(field));

        if let Err(e) = query.execute(&mut *tx).await {
            error!("Failed to insert record {position} into {table}: {e}");
            rollback(tx, table).await;
            return Err(DatabaseError::SqlError(e));
        }
        inserted += 1;
    }

    tx.commit().await.map_err(|e| {
        error!("Failed to commit {inserted} records into {table}: {e}");
        DatabaseError::SqlError(e)
    })?;

    if inserted == 0 {
        debug!("Committed empty batch for {table}");
    } else {
        info!("Committed {inserted} records into {table}");
    }

    Ok(BatchSummary { table, inserted })
}

/// Rolls back a failed batch. A rollback failure is only logged: the caller
/// returns the error that triggered it, and the transaction is discarded with
/// its connection either way.
async fn rollback(tx: Transaction<'static, Any>, table: LogTable) {
    match tx.rollback().await {
        Ok(()) => warn!("Rolled back batch insert into {table}"),
        Err(e) => error!("Failed to roll back batch insert into {table}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::queue::{record_channel, unbounded_record_channel, LogRecord};
    use crate::storage::test_helpers::{count_rows, create_test_store, dns_record, dns_rows};
    use std::time::Duration;

    #[tokio::test]
    async fn test_records_are_committed_in_order() {
        let (store, _dir) = create_test_store().await;
        let records: Vec<Vec<String>> = (1..=5)
            .map(|n| dns_record(n, &format!("host{n}.example.com")))
            .collect();
        let mut queue = RecordReceiver::from_records(records.clone());

        let summary = insert_batch(&store, LogTable::Dns, &mut queue, 3)
            .await
            .expect("batch should commit");

        assert_eq!(summary, BatchSummary { table: LogTable::Dns, inserted: 5 });
        let rows: Vec<Vec<String>> = dns_rows(&store)
            .await
            .into_iter()
            .map(|(ts, query, answer)| vec![ts, query, answer])
            .collect();
        assert_eq!(rows, records);
    }

    #[tokio::test]
    async fn test_empty_queue_commits_nothing() {
        let (store, _dir) = create_test_store().await;
        let mut queue = RecordReceiver::from_records(Vec::<LogRecord>::new());

        let summary = insert_batch(&store, LogTable::Dns, &mut queue, 3).await.unwrap();

        assert_eq!(summary.inserted, 0);
        assert_eq!(count_rows(&store, "dns").await, 0);
    }

    #[tokio::test]
    async fn test_wrong_arity_at_any_position_rolls_back_everything() {
        let (store, _dir) = create_test_store().await;

        for bad_position in 2..=6 {
            let mut records: Vec<Vec<String>> =
                (1..=6).map(|n| dns_record(n, "example.com")).collect();
            records[bad_position - 1].pop();
            let mut queue = RecordReceiver::from_records(records);

            let result = insert_batch(&store, LogTable::Dns, &mut queue, 3).await;

            match result {
                Err(DatabaseError::FieldCount {
                    position,
                    expected,
                    actual,
                }) => {
                    assert_eq!(position, bad_position);
                    assert_eq!(expected, 3);
                    assert_eq!(actual, 2);
                }
                other => panic!("expected FieldCount error, got {:?}", other),
            }
            assert_eq!(count_rows(&store, "dns").await, 0, "position {bad_position}");
        }
    }

    #[tokio::test]
    async fn test_driver_error_at_any_position_rolls_back_everything() {
        let (store, _dir) = create_test_store().await;

        for bad_position in 2..=5 {
            // Repeating the first uid violates conn's primary key
            let records: Vec<Vec<String>> = (1..=5)
                .map(|n| {
                    let uid = if n == bad_position { 1 } else { n };
                    vec![format!("C{uid}"), "10.0.0.1".to_string(), "10.0.0.2".to_string()]
                })
                .collect();
            let mut queue = RecordReceiver::from_records(records);

            let result = insert_batch(&store, LogTable::Conn, &mut queue, 3).await;

            assert!(
                matches!(result, Err(DatabaseError::SqlError(_))),
                "position {bad_position}: {:?}",
                result
            );
            assert_eq!(count_rows(&store, "conn").await, 0, "position {bad_position}");
        }
    }

    #[tokio::test]
    async fn test_failure_abandons_remaining_records() {
        let (store, _dir) = create_test_store().await;
        let records = vec![
            dns_record(1, "a.example.com"),
            vec!["too short".to_string()],
            dns_record(3, "c.example.com"),
        ];
        let mut queue = RecordReceiver::from_records(records);

        assert!(insert_batch(&store, LogTable::Dns, &mut queue, 3).await.is_err());

        // The record after the failing one was never consumed
        assert_eq!(queue.pop().await.unwrap(), Some(LogRecord::from(dns_record(3, "c.example.com"))));
    }

    #[tokio::test]
    async fn test_prepare_failure_leaves_queue_undrained() {
        let (store, _dir) = create_test_store().await;
        // `ssl` is a known table but the test schema does not create it
        let mut queue = RecordReceiver::from_records(vec![vec!["a", "b", "c"]]);

        let result = insert_batch(&store, LogTable::Ssl, &mut queue, 3).await;

        assert!(matches!(result, Err(DatabaseError::SqlError(_))));
        assert_eq!(queue.pop().await.unwrap(), Some(LogRecord::from(vec!["a", "b", "c"])));
    }

    #[tokio::test]
    async fn test_zero_field_count_is_rejected() {
        let (store, _dir) = create_test_store().await;
        let mut queue = RecordReceiver::from_records(vec![vec!["a"]]);

        let result = insert_batch(&store, LogTable::Dns, &mut queue, 0).await;

        assert!(matches!(result, Err(DatabaseError::InvalidFieldCount(0))));
        assert!(queue.pop().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_waits_for_producer_until_queue_closes() {
        let (store, _dir) = create_test_store().await;
        let (tx, mut rx) = record_channel(1);

        let producer = tokio::spawn(async move {
            for n in 1..=4 {
                tokio::time::sleep(Duration::from_millis(5)).await;
                tx.send(dns_record(n, "slow.example.com")).await.unwrap();
            }
            tx.close();
        });

        let summary = insert_batch(&store, LogTable::Dns, &mut rx, 3).await.unwrap();
        producer.await.unwrap();

        assert_eq!(summary.inserted, 4);
        assert_eq!(count_rows(&store, "dns").await, 4);
    }

    #[tokio::test]
    async fn test_nothing_visible_before_commit() {
        let (store, _dir) = create_test_store().await;
        let (tx, mut rx) = unbounded_record_channel();
        tx.send(dns_record(1, "pending.example.com")).await.unwrap();

        let inserter = {
            let store = store.clone();
            tokio::spawn(async move { insert_batch(&store, LogTable::Dns, &mut rx, 3).await })
        };

        // The inserter is parked on the open queue with one row written
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!inserter.is_finished());
        assert_eq!(count_rows(&store, "dns").await, 0);

        tx.close();
        let summary = inserter.await.unwrap().unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(count_rows(&store, "dns").await, 1);
    }

    #[tokio::test]
    async fn test_aborted_queue_rolls_back() {
        let (store, _dir) = create_test_store().await;
        let (tx, mut rx) = record_channel(8);
        tx.send(dns_record(1, "a.example.com")).await.unwrap();
        tx.send(dns_record(2, "b.example.com")).await.unwrap();
        tx.abort("read error").await;

        let result = insert_batch(&store, LogTable::Dns, &mut rx, 3).await;

        match result {
            Err(DatabaseError::ProducerFailed(reason)) => assert_eq!(reason, "read error"),
            other => panic!("expected ProducerFailed, got {:?}", other),
        }
        assert_eq!(count_rows(&store, "dns").await, 0);
    }
}
