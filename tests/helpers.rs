// Shared test helpers for database setup and test data creation.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use dns_logstore::{connect_url, LogStore};
use tempfile::TempDir;

/// Creates a file-backed SQLite store with the `dns` and `conn` tables.
/// Keep the returned `TempDir` alive while the store is in use.
#[allow(dead_code)] // Used by other test files
pub async fn create_test_store() -> (LogStore, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("logs.db").display());
    let store = connect_url(&url)
        .await
        .expect("Failed to connect to test database");

    for statement in [
        "CREATE TABLE dns (ts TEXT NOT NULL, query TEXT NOT NULL, answer TEXT NOT NULL)",
        "CREATE TABLE conn (uid TEXT PRIMARY KEY, orig_h TEXT NOT NULL, resp_h TEXT NOT NULL)",
    ] {
        sqlx::query(statement)
            .execute(store.pool())
            .await
            .expect("Failed to create test schema");
    }

    (store, dir)
}

/// Counts the rows of a table.
#[allow(dead_code)]
pub async fn count_rows(store: &LogStore, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(store.pool())
        .await
        .expect("Failed to count rows")
}

/// Returns a localhost port nothing is listening on.
#[allow(dead_code)]
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("No local addr").port();
    drop(listener);
    port
}
