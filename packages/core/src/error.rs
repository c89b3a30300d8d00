use std::error::Error;
use std::fmt;

use thiserror::Error;

/// Unified application error.
///
/// Used by the binary for startup failures (config, database bootstrap,
/// listener binding) so they are reported in one predictable shape.
#[derive(Debug)]
pub enum AppError {
    Config(String),
    Database(String),
    Network(String),
    Parse(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl Error for AppError {}

/// Errors from the data-access layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Duplicate key: {message}")]
    Duplicate { message: String },

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Duplicate {
                    message: db_err.message().to_string(),
                }
            }
            _ => StoreError::Database(err),
        }
    }
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}
