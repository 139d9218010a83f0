//! Aggregation queries over the log tables.

use serde::Serialize;
use sqlx::Row;

use crate::error_handling::DatabaseError;
use crate::storage::store::LogStore;

/// A queried domain (second-level plus top-level domain) and how many times
/// it was looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopDomain {
    /// The queried name
    pub query: String,
    /// Number of lookups
    pub count: i64,
}

const TOP_DOMAINS_SQL: &str =
    "SELECT query, COUNT(*) AS count FROM dns GROUP BY query ORDER BY count DESC LIMIT ?";

/// Returns the `limit` most frequent values of `dns.query`, most frequent first.
///
/// The order between values with the same count is whatever the database
/// returns. A `limit` of 0 returns nothing.
pub async fn top_domains(store: &LogStore, limit: u32) -> Result<Vec<TopDomain>, DatabaseError> {
    let rows = sqlx::query(TOP_DOMAINS_SQL)
        .bind(i64::from(limit))
        .fetch_all(store.pool())
        .await
        .map_err(|e| {
            log::error!("Failed to query top domains: {e}");
            DatabaseError::SqlError(e)
        })?;

    rows.iter()
        .map(|row| -> Result<TopDomain, DatabaseError> {
            Ok(TopDomain {
                query: row.try_get("query")?,
                count: row.try_get("count")?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::queue::RecordReceiver;
    use crate::storage::tables::LogTable;
    use crate::storage::test_helpers::{create_test_store, dns_record};

    async fn seed(store: &LogStore, counts: &[(&str, usize)]) {
        let mut records = Vec::new();
        let mut n = 0;
        for (query, count) in counts {
            for _ in 0..*count {
                n += 1;
                records.push(dns_record(n, query));
            }
        }
        let mut queue = RecordReceiver::from_records(records);
        store
            .insert_batch(LogTable::Dns, &mut queue, 3)
            .await
            .expect("Failed to seed dns table");
    }

    #[tokio::test]
    async fn test_top_five_orders_by_count() {
        let (store, _dir) = create_test_store().await;
        seed(
            &store,
            &[("f.com", 1), ("c.com", 3), ("a.com", 6), ("e.com", 1), ("b.com", 4), ("d.com", 2)],
        )
        .await;

        let top = store.top_five_domains().await.unwrap();

        assert_eq!(top.len(), 5);
        let expected = [("a.com", 6), ("b.com", 4), ("c.com", 3), ("d.com", 2)];
        for (row, (query, count)) in top.iter().zip(expected) {
            assert_eq!(row.query, query);
            assert_eq!(row.count, count);
        }
        // Tie between e.com and f.com: either may come fifth
        assert_eq!(top[4].count, 1);
        assert!(top[4].query == "e.com" || top[4].query == "f.com");
    }

    #[tokio::test]
    async fn test_fewer_domains_than_limit() {
        let (store, _dir) = create_test_store().await;
        seed(&store, &[("only.com", 2), ("other.com", 1)]).await;

        let top = top_domains(&store, 5).await.unwrap();

        assert_eq!(
            top,
            vec![
                TopDomain { query: "only.com".to_string(), count: 2 },
                TopDomain { query: "other.com".to_string(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_limit_bounds_are_applied() {
        let (store, _dir) = create_test_store().await;
        seed(&store, &[("a.com", 3), ("b.com", 2), ("c.com", 1)]).await;

        assert!(top_domains(&store, 0).await.unwrap().is_empty());
        assert_eq!(top_domains(&store, 1).await.unwrap().len(), 1);
        assert_eq!(top_domains(&store, u32::MAX).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_table() {
        let (store, _dir) = create_test_store().await;
        assert!(store.top_five_domains().await.unwrap().is_empty());
    }

    #[test]
    fn test_top_domain_serializes() {
        let row = TopDomain { query: "example.com".to_string(), count: 3 };
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"query":"example.com","count":3}"#
        );
    }
}
