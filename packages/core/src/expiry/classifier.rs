//! Stock status classification.

use chrono::NaiveDate;

use crate::expiry::types::{Classification, StockStatus};

/// Last day (inclusive) a stock counts as `critical`.
pub const CRITICAL_DAYS: i64 = 7;
/// Last day (inclusive) a stock counts as `warning`.
pub const WARNING_DAYS: i64 = 30;

/// Whole calendar days from `today` to `expiry`; negative once expired.
pub fn days_until_expiry(expiry: NaiveDate, today: NaiveDate) -> i64 {
    expiry.signed_duration_since(today).num_days()
}

/// Classify a stock lot by its expiry date.
pub fn classify(expiry: NaiveDate, today: NaiveDate) -> Classification {
    let days = days_until_expiry(expiry, today);

    let status = if days < 0 {
        StockStatus::Expired
    } else if days <= CRITICAL_DAYS {
        StockStatus::Critical
    } else if days <= WARNING_DAYS {
        StockStatus::Warning
    } else {
        StockStatus::Good
    };

    Classification {
        status,
        days_until_expiry: days,
    }
}
