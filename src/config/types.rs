//! Configuration types.
//!
//! This module defines the structs and enums used to configure the connector,
//! the ingest pipeline and logging. Everything can be constructed
//! programmatically; the binary fills them from environment variables.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use strum_macros::{AsRefStr, Display, EnumString};
use url::Url;

use crate::config::constants::{
    CONNECT_BASE_DELAY, CONNECT_MAX_ATTEMPTS, DEFAULT_DB_HOST, DEFAULT_DB_NAME, DEFAULT_DB_PORT,
    DEFAULT_DB_USER, DEFAULT_FIELD_COUNT, DEFAULT_FIELD_SEPARATOR, RECORD_QUEUE_CAPACITY,
};
use crate::error_handling::DatabaseError;
use crate::storage::LogTable;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Credentials and address of the database server.
///
/// All fields are plain strings, as they arrive from the environment. Nothing
/// is validated until [`ConnectionConfig::database_url`] builds the descriptor.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Database user
    pub user: String,
    /// Database password (may be empty)
    pub password: String,
    /// Server host name or IP address
    pub host: String,
    /// Server port
    pub port: String,
    /// Database (schema) name
    pub database: String,
    /// Full database URL; when set it takes precedence over the fields above
    pub url: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            user: DEFAULT_DB_USER.to_string(),
            password: String::new(),
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT.to_string(),
            database: DEFAULT_DB_NAME.to_string(),
            url: None,
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ConnectionConfig {
    /// Builds a MySQL connection config from its five parts.
    pub fn new(user: &str, password: &str, host: &str, port: &str, database: &str) -> Self {
        Self {
            user: user.to_string(),
            password: password.to_string(),
            host: host.to_string(),
            port: port.to_string(),
            database: database.to_string(),
            url: None,
        }
    }

    /// Reads the config from `DB_USER`, `DB_PASSWORD`, `DB_HOST`, `DB_PORT`,
    /// `DB_NAME` and `DATABASE_URL`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ConnectionConfig::from_env`] with a custom variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            user: lookup("DB_USER").unwrap_or(defaults.user),
            password: lookup("DB_PASSWORD").unwrap_or(defaults.password),
            host: lookup("DB_HOST").unwrap_or(defaults.host),
            port: lookup("DB_PORT").unwrap_or(defaults.port),
            database: lookup("DB_NAME").unwrap_or(defaults.database),
            url: lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()),
        }
    }

    /// Builds the `mysql://` URL describing this connection.
    ///
    /// Only the syntax of the arguments is checked here; no network I/O happens.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Configuration` if the host is empty, the port is
    /// not a valid TCP port, or the parts cannot form a URL.
    pub fn database_url(&self) -> Result<String, DatabaseError> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let host = self.host.trim();
        if host.is_empty() {
            return Err(DatabaseError::Configuration(
                "database host must not be empty".to_string(),
            ));
        }
        let port = u16::from_str(self.port.trim()).map_err(|e| {
            DatabaseError::Configuration(format!("invalid database port {:?}: {e}", self.port))
        })?;

        let mut url = Url::parse("mysql://localhost")
            .map_err(|e| DatabaseError::Configuration(e.to_string()))?;
        url.set_host(Some(host))
            .map_err(|e| DatabaseError::Configuration(format!("invalid database host {host:?}: {e}")))?;
        url.set_port(Some(port))
            .map_err(|_| DatabaseError::Configuration(format!("cannot set port {port}")))?;
        url.set_username(&self.user)
            .map_err(|_| DatabaseError::Configuration(format!("invalid user {:?}", self.user)))?;
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|_| DatabaseError::Configuration("invalid password".to_string()))?;
        }
        if !self.database.is_empty() {
            url.path_segments_mut()
                .map_err(|_| DatabaseError::Configuration("URL cannot carry a path".to_string()))?
                .clear()
                .push(&self.database);
        }

        Ok(url.to_string())
    }
}

/// Connection retry budget.
///
/// The connector probes at most `max_attempts` times. Before retry `n`
/// (1-based) it sleeps `n * base_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of probes, including the first one (at least 1)
    pub max_attempts: usize,
    /// Unit of the linear backoff
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: CONNECT_MAX_ATTEMPTS,
            base_delay: CONNECT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` below 1 is raised to 1.
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Sum of all sleeps when every probe but the last is retried, saturating
    /// at `Duration::MAX`.
    pub fn total_backoff(&self) -> Duration {
        crate::error_handling::get_retry_strategy(self).fold(Duration::ZERO, Duration::saturating_add)
    }
}

/// Application configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use dns_logstore::{Config, LogTable};
///
/// let config = Config {
///     table: LogTable::Dns,
///     num_values: 4,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Where to connect
    pub connection: ConnectionConfig,
    /// Connection retry budget
    pub retry: RetryPolicy,
    /// Destination table for ingested records
    pub table: LogTable,
    /// Expected number of fields per record
    pub num_values: usize,
    /// Field separator for ingested lines
    pub separator: char,
    /// Capacity of the bounded record queue
    pub queue_capacity: usize,
    /// Log level
    pub log_level: LogLevel,
    /// Log format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            retry: RetryPolicy::default(),
            table: LogTable::Dns,
            num_values: DEFAULT_FIELD_COUNT,
            separator: DEFAULT_FIELD_SEPARATOR,
            queue_capacity: RECORD_QUEUE_CAPACITY,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// Reads the full configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set to a value that cannot be parsed.
    pub fn from_env() -> Result<Self, DatabaseError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable lookup.
    ///
    /// # Errors
    ///
    /// `LOG_TABLE` outside the allow-list yields `DatabaseError::UnknownTable`;
    /// other unparsable values yield `DatabaseError::Configuration`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DatabaseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let connection = ConnectionConfig::from_lookup(&lookup);

        let table = match lookup("LOG_TABLE") {
            Some(name) => LogTable::parse(&name)?,
            None => defaults.table,
        };
        let num_values = match lookup("LOG_FIELDS") {
            Some(raw) => usize::from_str(raw.trim()).map_err(|e| {
                DatabaseError::Configuration(format!("invalid LOG_FIELDS {raw:?}: {e}"))
            })?,
            None => defaults.num_values,
        };
        let separator = match lookup("LOG_SEPARATOR") {
            Some(raw) => parse_separator(&raw)?,
            None => defaults.separator,
        };
        let log_level = match lookup("LOG_LEVEL") {
            Some(raw) => LogLevel::from_str(raw.trim()).map_err(|_| {
                DatabaseError::Configuration(format!("invalid LOG_LEVEL {raw:?}"))
            })?,
            None => defaults.log_level,
        };
        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => LogFormat::from_str(raw.trim()).map_err(|_| {
                DatabaseError::Configuration(format!("invalid LOG_FORMAT {raw:?}"))
            })?,
            None => defaults.log_format,
        };

        Ok(Self {
            connection,
            table,
            num_values,
            separator,
            log_level,
            log_format,
            ..defaults
        })
    }
}

fn parse_separator(raw: &str) -> Result<char, DatabaseError> {
    // "\t" is accepted literally since tabs are awkward to put in env files
    if raw == "\\t" {
        return Ok('\t');
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(DatabaseError::Configuration(format!(
            "LOG_SEPARATOR must be a single character, got {raw:?}"
        ))),
    }
}
