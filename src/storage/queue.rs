//! Record queue between a log producer and the batch inserter.
//!
//! A thin layer over `tokio::sync::mpsc`: `pop` waits until the next record
//! arrives or every sender is gone, and `close` on either side ends the stream.
//! A producer that fails calls `abort` instead, which `pop` reports as an
//! error so the consumer can tell a failed stream from a finished one.

use std::fmt::Display;

use serde::Serialize;
use log::debug;
use tokio::sync::mpsc;

use crate::error_handling::DatabaseError;

/// One row to insert: ordered string fields bound positionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord(Vec<String>);

impl LogRecord {
    /// Creates a record from its fields.
    pub fn new(fields: Vec<String>) -> Self {
        LogRecord(fields)
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the fields.
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// Consumes the record, returning its fields.
    pub fn into_fields(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for LogRecord {
    fn from(fields: Vec<String>) -> Self {
        LogRecord(fields)
    }
}

impl From<Vec<&str>> for LogRecord {
    fn from(fields: Vec<&str>) -> Self {
        LogRecord(fields.into_iter().map(str::to_string).collect())
    }
}

#[derive(Debug)]
enum Message {
    Record(LogRecord),
    Abort(String),
}

#[derive(Debug, Clone)]
enum SenderInner {
    Bounded(mpsc::Sender<Message>),
    Unbounded(mpsc::UnboundedSender<Message>),
}

#[derive(Debug)]
enum ReceiverInner {
    Bounded(mpsc::Receiver<Message>),
    Unbounded(mpsc::UnboundedReceiver<Message>),
}

/// Producer side of a record queue. Clone it for multiple producers.
#[derive(Debug, Clone)]
pub struct RecordSender {
    inner: SenderInner,
}

/// Consumer side of a record queue.
#[derive(Debug)]
pub struct RecordReceiver {
    inner: ReceiverInner,
}

/// Creates a bounded record queue.
///
/// `send` waits while `capacity` records are pending, so a slow database
/// pushes back on the producer. A capacity of 0 is raised to 1.
pub fn record_channel(capacity: usize) -> (RecordSender, RecordReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        RecordSender {
            inner: SenderInner::Bounded(tx),
        },
        RecordReceiver {
            inner: ReceiverInner::Bounded(rx),
        },
    )
}

/// Creates an unbounded record queue. `send` never waits.
pub fn unbounded_record_channel() -> (RecordSender, RecordReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        RecordSender {
            inner: SenderInner::Unbounded(tx),
        },
        RecordReceiver {
            inner: ReceiverInner::Unbounded(rx),
        },
    )
}

impl RecordSender {
    /// Pushes a record onto the queue, waiting for room if it is bounded.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::QueueClosed` if the receiver was closed or dropped.
    pub async fn send(&self, record: impl Into<LogRecord>) -> Result<(), DatabaseError> {
        self.push(Message::Record(record.into())).await
    }

    /// Marks the stream as failed.
    ///
    /// The consumer receives `DatabaseError::ProducerFailed(reason)` once it
    /// has popped the records sent before this call. If the receiver is
    /// already gone there is nobody to tell, and the abort is dropped.
    pub async fn abort(self, reason: impl Display) {
        let reason = reason.to_string();
        if self.push(Message::Abort(reason.clone())).await.is_err() {
            debug!("Record queue already closed, dropping abort: {reason}");
        }
    }

    async fn push(&self, message: Message) -> Result<(), DatabaseError> {
        match &self.inner {
            SenderInner::Bounded(tx) => tx.send(message).await.map_err(|_| DatabaseError::QueueClosed),
            SenderInner::Unbounded(tx) => tx.send(message).map_err(|_| DatabaseError::QueueClosed),
        }
    }

    /// Returns true once the receiver has been closed or dropped.
    pub fn is_closed(&self) -> bool {
        match &self.inner {
            SenderInner::Bounded(tx) => tx.is_closed(),
            SenderInner::Unbounded(tx) => tx.is_closed(),
        }
    }

    /// Signals end of stream from this producer.
    ///
    /// The queue is closed once every clone of the sender has been closed or dropped.
    pub fn close(self) {
        drop(self);
    }
}

impl RecordReceiver {
    /// Builds an already-closed queue holding `records` in order.
    pub fn from_records<I, R>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<LogRecord>,
    {
        let (tx, rx) = unbounded_record_channel();
        if let SenderInner::Unbounded(tx) = &tx.inner {
            for record in records {
                // The receiver is alive in this scope, so send cannot fail
                let _ = tx.send(Message::Record(record.into()));
            }
        }
        rx
    }

    /// Waits for the next record.
    ///
    /// Returns `Ok(None)` once the queue is closed and every pending record has
    /// been received.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::ProducerFailed` when a producer called
    /// [`RecordSender::abort`].
    pub async fn pop(&mut self) -> Result<Option<LogRecord>, DatabaseError> {
        let message = match &mut self.inner {
            ReceiverInner::Bounded(rx) => rx.recv().await,
            ReceiverInner::Unbounded(rx) => rx.recv().await,
        };
        match message {
            Some(Message::Record(record)) => Ok(Some(record)),
            Some(Message::Abort(reason)) => Err(DatabaseError::ProducerFailed(reason)),
            None => Ok(None),
        }
    }

    /// Stops producers from sending more records.
    ///
    /// Records already queued can still be popped.
    pub fn close(&mut self) {
        match &mut self.inner {
            ReceiverInner::Bounded(rx) => rx.close(),
            ReceiverInner::Unbounded(rx) => rx.close(),
        }
    }
}
