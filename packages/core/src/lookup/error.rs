//! Error types for medicine lookup

use thiserror::Error;

use crate::error::StoreError;

/// Errors from a single medicine data provider.
///
/// None of these abort a lookup: the chain records them and moves on to the
/// next provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Provider timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Provider returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Data format error: {message}")]
    FormatError { message: String },

    #[error("Service unavailable")]
    ServiceUnavailable,
}

impl ProviderError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::FormatError {
            message: message.into(),
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_seconds: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                seconds: timeout_seconds,
            }
        } else if err.is_decode() {
            Self::format(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

/// Errors surfaced by [`MedicineResolver`](crate::lookup::MedicineResolver).
///
/// A barcode nobody knows is not an error; see
/// [`Resolution::NotFound`](crate::lookup::Resolution::NotFound).
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid barcode: {reason}")]
    InvalidBarcode { reason: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}
