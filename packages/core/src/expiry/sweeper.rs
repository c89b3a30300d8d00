//! Expiry sweeper - turns the current stock snapshot into alert rows.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::expiry::{
    error::SweepError,
    store::AlertStore,
    types::{AlertBucket, SweepReport},
};

/// Scans stock for each alert bucket and inserts deduplicated alerts.
#[derive(Clone)]
pub struct ExpirySweeper {
    store: Arc<dyn AlertStore + Send + Sync>,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn AlertStore + Send + Sync>) -> Self {
        Self { store }
    }

    /// Run one sweep as of `today`.
    ///
    /// Buckets are processed one after another and stocks inside a bucket
    /// sequentially, so inserts for the same stock never race each other.
    /// The in-memory existence check only saves a round trip; a
    /// [`StoreError::Duplicate`](crate::error::StoreError::Duplicate) from
    /// the store means another sweep got there first and is skipped.
    pub async fn run(&self, today: NaiveDate) -> Result<SweepReport, SweepError> {
        let mut report = SweepReport::new(today);

        tracing::info!("Expiry sweep started (as of {})", today);

        for bucket in AlertBucket::ALL {
            if let Err(source) = self.sweep_bucket(bucket, today, &mut report).await {
                tracing::error!(
                    "Expiry sweep aborted in {} after {} new alerts: {}",
                    bucket,
                    report.created,
                    source
                );
                return Err(SweepError {
                    bucket,
                    partial: report,
                    source,
                });
            }
        }

        tracing::info!(
            "Expiry sweep finished: {} new alerts (30d: {}, 15d: {}, 7d: {}, expired: {})",
            report.created,
            report.count(AlertBucket::Within30Days),
            report.count(AlertBucket::Within15Days),
            report.count(AlertBucket::Within7Days),
            report.count(AlertBucket::Expired),
        );

        Ok(report)
    }

    async fn sweep_bucket(
        &self,
        bucket: AlertBucket,
        today: NaiveDate,
        report: &mut SweepReport,
    ) -> Result<(), crate::error::StoreError> {
        let stocks = self.store.find_stocks_in_window(bucket, today).await?;

        for stock in stocks {
            if self.store.alert_exists_today(stock.id, bucket, today).await? {
                continue;
            }

            match self.store.insert_alert(stock.id, bucket, today).await {
                Ok(Some(alert_id)) => {
                    tracing::debug!(
                        "Created {} alert {} for stock {}",
                        bucket,
                        alert_id,
                        stock.id
                    );
                    report.record(bucket);
                }
                Ok(None) => {
                    tracing::debug!("Stock {} disappeared before {} alert insert", stock.id, bucket);
                }
                Err(err) if err.is_duplicate() => {
                    tracing::debug!(
                        "Concurrent sweep already alerted stock {} for {}",
                        stock.id,
                        bucket
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Days;

    use crate::error::StoreError;
    use crate::expiry::types::StockRecord;

    /// Alert store over plain vectors, with optional failure injection.
    #[derive(Default)]
    struct MemoryAlertStore {
        stocks: Vec<StockRecord>,
        alerts: Mutex<Vec<(i64, AlertBucket, NaiveDate)>>,
        fail_after_inserts: Option<usize>,
        inserts: AtomicUsize,
        skip_existence_check: bool,
    }

    impl MemoryAlertStore {
        fn with_stocks(stocks: Vec<StockRecord>) -> Self {
            Self {
                stocks,
                ..Default::default()
            }
        }

        fn alert_count(&self) -> usize {
            self.alerts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AlertStore for MemoryAlertStore {
        async fn find_stocks_in_window(
            &self,
            bucket: AlertBucket,
            as_of: NaiveDate,
        ) -> Result<Vec<StockRecord>, StoreError> {
            let window = bucket.window(as_of);
            Ok(self
                .stocks
                .iter()
                .filter(|s| window.contains(s.expiry_date))
                .cloned()
                .collect())
        }

        async fn alert_exists_today(
            &self,
            stock_id: i64,
            bucket: AlertBucket,
            today: NaiveDate,
        ) -> Result<bool, StoreError> {
            if self.skip_existence_check {
                return Ok(false);
            }
            Ok(self
                .alerts
                .lock()
                .unwrap()
                .iter()
                .any(|a| *a == (stock_id, bucket, today)))
        }

        async fn insert_alert(
            &self,
            stock_id: i64,
            bucket: AlertBucket,
            today: NaiveDate,
        ) -> Result<Option<i64>, StoreError> {
            let n = self.inserts.fetch_add(1, Ordering::SeqCst);
            if let Some(limit) = self.fail_after_inserts {
                if n >= limit {
                    return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
                }
            }

            let mut alerts = self.alerts.lock().unwrap();
            if alerts.contains(&(stock_id, bucket, today)) {
                return Err(StoreError::Duplicate {
                    message: "UNIQUE constraint failed".into(),
                });
            }
            alerts.push((stock_id, bucket, today));
            Ok(Some(alerts.len() as i64))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn stock(id: i64, expiry: NaiveDate) -> StockRecord {
        StockRecord {
            id,
            owner_id: 1,
            medicine_id: 1,
            quantity: 10,
            expiry_date: expiry,
            location: None,
            purchase_date: None,
            purchase_price: None,
            notes: None,
        }
    }

    fn sweeper(store: &Arc<MemoryAlertStore>) -> ExpirySweeper {
        ExpirySweeper::new(store.clone())
    }

    #[tokio::test]
    async fn stock_five_days_out_gets_three_layered_alerts() {
        let store = Arc::new(MemoryAlertStore::with_stocks(vec![stock(
            1,
            today() + Days::new(5),
        )]));

        let report = sweeper(&store).run(today()).await.unwrap();

        assert_eq!(report.created, 3);
        assert_eq!(report.count(AlertBucket::Within30Days), 1);
        assert_eq!(report.count(AlertBucket::Within15Days), 1);
        assert_eq!(report.count(AlertBucket::Within7Days), 1);
        assert_eq!(report.count(AlertBucket::Expired), 0);
    }

    #[tokio::test]
    async fn second_sweep_same_day_creates_nothing() {
        let store = Arc::new(MemoryAlertStore::with_stocks(vec![
            stock(1, today() + Days::new(5)),
            stock(2, today() - Days::new(1)),
            stock(3, today() + Days::new(20)),
        ]));
        let sweeper = sweeper(&store);

        let first = sweeper.run(today()).await.unwrap();
        let second = sweeper.run(today()).await.unwrap();

        assert_eq!(first.created, 5);
        assert_eq!(second.created, 0);
        assert_eq!(store.alert_count(), 5);
    }

    #[tokio::test]
    async fn expired_stock_is_alerted_again_on_the_next_day() {
        let store = Arc::new(MemoryAlertStore::with_stocks(vec![stock(
            1,
            today() - Days::new(1),
        )]));
        let sweeper = sweeper(&store);

        assert_eq!(sweeper.run(today()).await.unwrap().count(AlertBucket::Expired), 1);
        assert_eq!(sweeper.run(today()).await.unwrap().created, 0);

        let tomorrow = sweeper.run(today() + Days::new(1)).await.unwrap();
        assert_eq!(tomorrow.count(AlertBucket::Expired), 1);
        assert_eq!(tomorrow.created, 1);
    }

    #[tokio::test]
    async fn stock_far_in_future_is_ignored() {
        let store = Arc::new(MemoryAlertStore::with_stocks(vec![stock(
            1,
            today() + Days::new(31),
        )]));

        let report = sweeper(&store).run(today()).await.unwrap();

        assert_eq!(report.created, 0);
    }

    #[tokio::test]
    async fn duplicate_from_store_is_treated_as_already_alerted() {
        let store = Arc::new(MemoryAlertStore {
            stocks: vec![stock(1, today())],
            skip_existence_check: true,
            ..Default::default()
        });
        let sweeper = sweeper(&store);

        sweeper.run(today()).await.unwrap();
        let second = sweeper.run(today()).await.unwrap();

        assert_eq!(second.created, 0);
        assert_eq!(store.alert_count(), 3);
    }

    #[tokio::test]
    async fn persistence_failure_aborts_and_keeps_committed_inserts() {
        let store = Arc::new(MemoryAlertStore {
            stocks: vec![stock(1, today() + Days::new(3))],
            fail_after_inserts: Some(1),
            ..Default::default()
        });

        let err = sweeper(&store).run(today()).await.unwrap_err();

        assert_eq!(err.bucket, AlertBucket::Within15Days);
        assert_eq!(err.partial.created, 1);
        assert_eq!(store.alert_count(), 1);
    }

    #[tokio::test]
    async fn retry_after_failure_fills_in_the_rest() {
        let failing = Arc::new(MemoryAlertStore {
            stocks: vec![stock(1, today() + Days::new(3))],
            fail_after_inserts: Some(1),
            ..Default::default()
        });
        assert!(sweeper(&failing).run(today()).await.is_err());

        let recovered = Arc::new(MemoryAlertStore {
            stocks: failing.stocks.clone(),
            alerts: Mutex::new(failing.alerts.lock().unwrap().clone()),
            ..Default::default()
        });
        let report = sweeper(&recovered).run(today()).await.unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(recovered.alert_count(), 3);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            /// Each stock gets exactly one alert per bucket window it sits in,
            /// and a same-day re-run adds nothing.
            #[test]
            fn sweep_matches_windows_and_is_idempotent(
                offsets in prop::collection::vec(-60i64..60, 0..12)
            ) {
                let stocks: Vec<_> = offsets
                    .iter()
                    .enumerate()
                    .map(|(i, off)| {
                        let expiry = if *off >= 0 {
                            today() + Days::new(*off as u64)
                        } else {
                            today() - Days::new(off.unsigned_abs())
                        };
                        stock(i as i64 + 1, expiry)
                    })
                    .collect();
                let expected: u64 = stocks
                    .iter()
                    .map(|s| {
                        AlertBucket::ALL
                            .iter()
                            .filter(|b| b.window(today()).contains(s.expiry_date))
                            .count() as u64
                    })
                    .sum();

                let store = Arc::new(MemoryAlertStore::with_stocks(stocks));
                let sweeper = sweeper(&store);

                let first = tokio_test::block_on(sweeper.run(today())).unwrap();
                let second = tokio_test::block_on(sweeper.run(today())).unwrap();

                prop_assert_eq!(first.created, expected);
                prop_assert_eq!(second.created, 0);
                prop_assert_eq!(store.alert_count() as u64, expected);
            }
        }
    }
}
