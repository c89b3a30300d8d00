//! Data-access interface consumed by the expiry sweeper.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreError;
use crate::expiry::types::{AlertBucket, StockRecord};

/// Persistence operations needed to turn stock into alerts.
///
/// Implementations must enforce uniqueness of `(stock_id, bucket, day)`;
/// `insert_alert` reports a collision as [`StoreError::Duplicate`].
#[async_trait]
pub trait AlertStore {
    /// Stocks whose expiry date falls inside `bucket`'s window as of `as_of`.
    async fn find_stocks_in_window(
        &self,
        bucket: AlertBucket,
        as_of: NaiveDate,
    ) -> Result<Vec<StockRecord>, StoreError>;

    async fn alert_exists_today(
        &self,
        stock_id: i64,
        bucket: AlertBucket,
        today: NaiveDate,
    ) -> Result<bool, StoreError>;

    /// Insert an unread alert. Returns `None` when the stock no longer exists.
    async fn insert_alert(
        &self,
        stock_id: i64,
        bucket: AlertBucket,
        today: NaiveDate,
    ) -> Result<Option<i64>, StoreError>;
}
