//! Application initialization.
//!
//! Sets up process-wide resources (currently the logger). The database handle
//! is not one of them; the connector returns it to the caller.

mod logger;

// Re-export public API
pub use logger::init_logger_with;
