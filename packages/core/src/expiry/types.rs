//! Core data types for expiry monitoring

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Urgency tier of an expiry alert.
///
/// Variants are declared in ascending urgency so the derived `Ord` gives
/// `Expired > Within7Days > Within15Days > Within30Days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertBucket {
    #[serde(rename = "within_30_days")]
    Within30Days,
    #[serde(rename = "within_15_days")]
    Within15Days,
    #[serde(rename = "within_7_days")]
    Within7Days,
    #[serde(rename = "expired")]
    Expired,
}

impl AlertBucket {
    /// Sweep order.
    pub const ALL: [AlertBucket; 4] = [
        AlertBucket::Within30Days,
        AlertBucket::Within15Days,
        AlertBucket::Within7Days,
        AlertBucket::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertBucket::Within30Days => "within_30_days",
            AlertBucket::Within15Days => "within_15_days",
            AlertBucket::Within7Days => "within_7_days",
            AlertBucket::Expired => "expired",
        }
    }

    /// Expiry-date window selected by this bucket as of `today`.
    ///
    /// The "within" windows all start at `today`, so they overlap: a stock
    /// five days from expiry falls in all three of them.
    pub fn window(&self, today: NaiveDate) -> ExpiryWindow {
        let ahead = |days: u64| {
            today
                .checked_add_days(Days::new(days))
                .unwrap_or(NaiveDate::MAX)
        };
        match self {
            AlertBucket::Within30Days => ExpiryWindow::Between(today, ahead(30)),
            AlertBucket::Within15Days => ExpiryWindow::Between(today, ahead(15)),
            AlertBucket::Within7Days => ExpiryWindow::Between(today, ahead(7)),
            AlertBucket::Expired => ExpiryWindow::Before(today),
        }
    }
}

impl fmt::Display for AlertBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertBucket::ALL
            .into_iter()
            .find(|bucket| bucket.as_str() == s)
            .ok_or_else(|| format!("Unknown alert bucket '{}'", s))
    }
}

/// Inclusive date range (or open-ended lower range) an alert bucket covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryWindow {
    /// `start <= expiry <= end`
    Between(NaiveDate, NaiveDate),
    /// `expiry < date`
    Before(NaiveDate),
}

impl ExpiryWindow {
    pub fn contains(&self, expiry: NaiveDate) -> bool {
        match *self {
            ExpiryWindow::Between(start, end) => start <= expiry && expiry <= end,
            ExpiryWindow::Before(date) => expiry < date,
        }
    }
}

/// Display status of a stock lot, independent from alert buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Good,
    Warning,
    Critical,
    Expired,
}

/// Output of the status classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub status: StockStatus,
    pub days_until_expiry: i64,
}

/// A persisted stock lot of a medicine owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: i64,
    pub owner_id: i64,
    pub medicine_id: i64,
    pub quantity: u32,
    pub expiry_date: NaiveDate,
    pub location: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub notes: Option<String>,
}

/// Result of one sweep invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub as_of: NaiveDate,
    pub created: u64,
    pub per_bucket: BTreeMap<AlertBucket, u64>,
}

impl SweepReport {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            created: 0,
            per_bucket: AlertBucket::ALL.into_iter().map(|b| (b, 0)).collect(),
        }
    }

    pub fn record(&mut self, bucket: AlertBucket) {
        *self.per_bucket.entry(bucket).or_insert(0) += 1;
        self.created += 1;
    }

    pub fn count(&self, bucket: AlertBucket) -> u64 {
        self.per_bucket.get(&bucket).copied().unwrap_or(0)
    }
}
