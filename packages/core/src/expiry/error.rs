//! Error types for expiry sweeps

use thiserror::Error;

use crate::error::StoreError;
use crate::expiry::types::{AlertBucket, SweepReport};

/// A sweep stopped early because persistence failed.
///
/// Alerts inserted before the failure stay committed; `partial` reports
/// them so callers can log what did land. Re-running the sweep is safe.
#[derive(Error, Debug)]
#[error("Expiry sweep failed while processing {bucket}: {source}")]
pub struct SweepError {
    pub bucket: AlertBucket,
    pub partial: SweepReport,
    #[source]
    pub source: StoreError,
}
