//! Database error types shared across the workspace

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Errors raised by the database layer
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failure while establishing the connection pool
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Failure while executing a query
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Failure while applying schema migrations
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Invalid configuration value, typically a bad environment variable
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
