//! Shared test helpers for storage module tests.
//!
//! This module provides common utilities for database setup and test data creation
//! used across storage module tests.

#[cfg(test)]
use tempfile::TempDir;

#[cfg(test)]
use crate::storage::{connect_url, LogStore};

/// Log table layouts used by tests. `conn.uid` is a primary key so that a
/// duplicate row fails at the driver level.
#[cfg(test)]
pub const TEST_SCHEMA: &[&str] = &[
    "CREATE TABLE dns (ts TEXT NOT NULL, query TEXT NOT NULL, answer TEXT NOT NULL)",
    "CREATE TABLE conn (uid TEXT PRIMARY KEY, orig_h TEXT NOT NULL, resp_h TEXT NOT NULL)",
];

/// Creates a file-backed SQLite store with [`TEST_SCHEMA`] applied.
///
/// Keep the returned `TempDir` alive for as long as the store is used.
/// An in-memory database is not used because every pooled connection would
/// see its own empty database.
#[cfg(test)]
pub async fn create_test_store() -> (LogStore, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("logs.db").display());
    let store = connect_url(&url)
        .await
        .expect("Failed to connect to test database");
    for statement in TEST_SCHEMA {
        sqlx::query(statement)
            .execute(store.pool())
            .await
            .expect("Failed to create test schema");
    }
    (store, dir)
}

/// Returns all `dns` rows in insertion order.
#[cfg(test)]
pub async fn dns_rows(store: &LogStore) -> Vec<(String, String, String)> {
    sqlx::query_as::<_, (String, String, String)>(
        "SELECT ts, query, answer FROM dns ORDER BY rowid",
    )
    .fetch_all(store.pool())
    .await
    .expect("Failed to read dns rows")
}

/// Counts the rows of a test table.
#[cfg(test)]
pub async fn count_rows(store: &LogStore, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(store.pool())
        .await
        .expect("Failed to count rows")
}

/// Builds a `dns` record: timestamp, queried name, answer.
#[cfg(test)]
pub fn dns_record(n: usize, query: &str) -> Vec<String> {
    vec![
        format!("1704067200.{n:06}"),
        query.to_string(),
        format!("192.0.2.{}", n % 255),
    ]
}
