//! Line-oriented log producer.
//!
//! Turns a stream of delimited log lines (Zeek TSV by default) into records
//! on a queue. Blank lines and `#` header lines are skipped.

use log::{debug, error, info};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::config::Config;
use crate::error_handling::DatabaseError;
use crate::storage::{record_channel, BatchSummary, LogRecord, LogStore, RecordSender};

/// Splits one log line into a record.
///
/// Returns `None` for lines that carry no data (blank, or starting with `#`).
/// A trailing `\r` is dropped so CRLF input behaves like LF input.
pub fn parse_line(line: &str, separator: char) -> Option<LogRecord> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() || line.starts_with('#') {
        return None;
    }
    Some(LogRecord::new(
        line.split(separator).map(str::to_string).collect(),
    ))
}

/// Reads `reader` to the end, sending one record per data line.
///
/// The sender is consumed, so the queue is closed when this returns (unless
/// other clones are still alive). Returns the number of records sent.
///
/// # Errors
///
/// - `DatabaseError::Io` if reading fails. The queue is aborted first, so the
///   consumer sees `DatabaseError::ProducerFailed` instead of a clean end.
/// - `DatabaseError::QueueClosed` if the consumer stopped early
pub async fn read_records<R>(
    reader: R,
    sender: RecordSender,
    separator: char,
) -> Result<usize, DatabaseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut sent = 0;
    let mut skipped = 0;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input after {sent} records: {e}");
                sender.abort(&e).await;
                return Err(DatabaseError::Io(e));
            }
        };
        match parse_line(&line, separator) {
            Some(record) => {
                sender.send(record).await?;
                sent += 1;
            }
            None => skipped += 1,
        }
    }

    debug!("Skipped {skipped} header or blank lines");
    info!("Read {sent} records from input");
    sender.close();
    Ok(sent)
}

/// Streams `reader` into `config.table` as one batch.
///
/// The reader runs on its own task feeding a queue of `config.queue_capacity`
/// records while the batch inserter drains it. Both sides are always joined
/// before this returns, whichever of them fails.
///
/// # Errors
///
/// The first real cause of failure: the reader's `DatabaseError::Io` when the
/// input could not be read (the batch is rolled back), otherwise the
/// inserter's error.
pub async fn load<R>(store: &LogStore, reader: R, config: &Config) -> Result<BatchSummary, DatabaseError>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (sender, mut records) = record_channel(config.queue_capacity);
    let separator = config.separator;
    let producer = tokio::spawn(async move { read_records(reader, sender, separator).await });

    let inserted = store
        .insert_batch(config.table, &mut records, config.num_values)
        .await;
    // Unblocks the producer if the insert stopped early
    drop(records);
    let read = producer
        .await
        .map_err(|e| DatabaseError::ProducerFailed(format!("input reader panicked: {e}")))?;

    match (inserted, read) {
        (Ok(summary), Ok(read)) => {
            info!("Read {read} records, committed {}", summary.inserted);
            Ok(summary)
        }
        (Err(DatabaseError::ProducerFailed(_)), Err(e)) => Err(e),
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => Err(e),
    }
}
