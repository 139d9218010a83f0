//! Database connection with bounded retry.
//!
//! Building the connection descriptor only validates the arguments. The
//! server is then probed (connect + ping on a dedicated connection) until it
//! answers, refuses too often, or fails for a reason retrying cannot fix:
//! - connection refused: sleep `attempt * base_delay`, probe again
//! - any other error: returned as is
//! - still refused on the last attempt: `DatabaseError::Timeout`
//!
//! A success on the last attempt is a success.

use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, error, info, warn};
use sqlx::any::{install_default_drivers, AnyConnectOptions, AnyPoolOptions};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tokio_retry::RetryIf;
use url::Url;

use crate::config::{ConnectionConfig, RetryPolicy};
use crate::error_handling::{backoff_delay, get_retry_strategy, is_connection_refused, DatabaseError};
use crate::storage::store::LogStore;

/// Connects to the database described by `config` with the default retry policy.
///
/// # Errors
///
/// See [`connect_url_with_policy`].
pub async fn connect(config: &ConnectionConfig) -> Result<LogStore, DatabaseError> {
    connect_with_policy(config, RetryPolicy::default()).await
}

/// Connects to the database described by `config` with an explicit retry policy.
///
/// # Errors
///
/// See [`connect_url_with_policy`].
pub async fn connect_with_policy(
    config: &ConnectionConfig,
    policy: RetryPolicy,
) -> Result<LogStore, DatabaseError> {
    let url = config.database_url().map_err(|e| {
        error!("Invalid database configuration {:?}: {e}", config);
        e
    })?;
    connect_url_with_policy(&url, policy).await
}

/// Connects to a database URL (`mysql://...` or `sqlite://...`) with the
/// default retry policy.
///
/// # Errors
///
/// See [`connect_url_with_policy`].
pub async fn connect_url(url: &str) -> Result<LogStore, DatabaseError> {
    connect_url_with_policy(url, RetryPolicy::default()).await
}

/// Connects to a database URL, probing the server until it is reachable.
///
/// # Errors
///
/// - `DatabaseError::Configuration` if the URL is malformed or its scheme is
///   not supported (no probe is made)
/// - `DatabaseError::Timeout` if the server refused every probe
/// - `DatabaseError::SqlError` for any other probe failure
pub async fn connect_url_with_policy(
    url: &str,
    policy: RetryPolicy,
) -> Result<LogStore, DatabaseError> {
    install_default_drivers();

    let options = parse_connect_options(url)?;
    let attempts = retry_probe(&policy, || probe(&options)).await.map_err(|e| {
        error!("Failed to connect to database: {e}");
        e
    })?;
    info!("Connected to database after {attempts} attempt(s)");

    let pool = AnyPoolOptions::new().connect_lazy_with(options);
    Ok(LogStore::new(pool))
}

/// Runs `probe` until it succeeds, following `policy`.
///
/// Only "connection refused" errors are retried. Returns the number of probes
/// made on success.
///
/// # Errors
///
/// - `DatabaseError::Timeout` if the last allowed probe was refused too
/// - `DatabaseError::SqlError` with the probe's own error for anything else
pub async fn retry_probe<F, Fut>(policy: &RetryPolicy, mut probe: F) -> Result<usize, DatabaseError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), sqlx::Error>>,
{
    let attempts = AtomicUsize::new(0);
    let max_attempts = policy.max_attempts;

    let result = RetryIf::spawn(
        get_retry_strategy(policy),
        || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            debug!("Probing database (attempt {attempt}/{max_attempts})");
            probe()
        },
        |e: &sqlx::Error| {
            let attempt = attempts.load(Ordering::SeqCst);
            if attempt >= max_attempts || !is_connection_refused(e) {
                return false;
            }
            warn!(
                "Couldn't connect to database, retrying in {:?} (attempt {attempt}/{max_attempts}): {e}",
                backoff_delay(policy.base_delay, u32::try_from(attempt).unwrap_or(u32::MAX))
            );
            true
        },
    )
    .await;

    let attempts = attempts.load(Ordering::SeqCst);
    match result {
        Ok(()) => Ok(attempts),
        Err(e) if is_connection_refused(&e) => Err(DatabaseError::Timeout { attempts }),
        Err(e) => Err(DatabaseError::SqlError(e)),
    }
}

/// Validates the URL for its driver without touching the network.
fn parse_connect_options(url: &str) -> Result<AnyConnectOptions, DatabaseError> {
    let parsed = Url::parse(url)
        .map_err(|e| DatabaseError::Configuration(format!("invalid database URL: {e}")))?;

    let checked = match parsed.scheme() {
        "mysql" | "mariadb" => MySqlConnectOptions::from_str(url).map(|_| ()),
        "sqlite" => SqliteConnectOptions::from_str(url).map(|_| ()),
        other => {
            return Err(DatabaseError::Configuration(format!(
                "unsupported database scheme {other:?}"
            )))
        }
    };
    checked.map_err(|e| DatabaseError::Configuration(e.to_string()))?;

    AnyConnectOptions::from_str(url).map_err(|e| DatabaseError::Configuration(e.to_string()))
}

/// One reachability check on a dedicated connection.
///
/// The pool is not used here because it retries refused connections on its own.
async fn probe(options: &AnyConnectOptions) -> Result<(), sqlx::Error> {
    let mut conn = options.connect().await?;
    conn.ping().await?;
    if let Err(e) = conn.close().await {
        debug!("Ignoring error while closing probe connection: {e}");
    }
    Ok(())
}
