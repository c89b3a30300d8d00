//! Database repository for medicines, stock lots and expiry alerts.
//!
//! All SQLite read/write logic lives here. [`MedicineRepository`] backs the
//! expiry sweeper through [`AlertStore`] and the barcode resolver through
//! [`MedicineStore`]; the remaining methods serve the HTTP handlers.
//!
//! Dates are stored as `YYYY-MM-DD` text and timestamps as RFC 3339 strings.

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::StoreError;
use crate::expiry::{classify, AlertBucket, AlertStore, ExpiryWindow, StockRecord, StockStatus};
use crate::lookup::{MedicineRecord, MedicineStore, NewMedicine};

const STOCK_COLUMNS: &str = "ms.id, ms.owner_id, ms.medicine_id, ms.quantity, ms.expiry_date,
     ms.location, ms.purchase_date, ms.purchase_price, ms.notes";

const MEDICINE_COLUMNS: &str = "id, owner_id, barcode, name, active_ingredient, manufacturer,
     dosage_form, strength, package_size, description, country, prescription_required, created_at";

/// Fields for a new stock lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStock {
    pub medicine_id: i64,
    pub quantity: u32,
    pub expiry_date: NaiveDate,
    pub location: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub notes: Option<String>,
}

/// Partial update of a stock lot; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockUpdate {
    pub quantity: Option<u32>,
    pub expiry_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub notes: Option<String>,
}

impl StockUpdate {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none()
            && self.expiry_date.is_none()
            && self.location.is_none()
            && self.purchase_date.is_none()
            && self.purchase_price.is_none()
            && self.notes.is_none()
    }
}

/// A stock lot joined with its medicine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockListing {
    #[serde(flatten)]
    pub stock: StockRecord,
    pub medicine_name: String,
    pub barcode: String,
    pub active_ingredient: Option<String>,
    pub manufacturer: Option<String>,
}

/// A stock listing with its status as of a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockWithStatus {
    #[serde(flatten)]
    pub listing: StockListing,
    pub status: StockStatus,
    pub days_until_expiry: i64,
}

impl StockListing {
    pub fn with_status(self, today: NaiveDate) -> StockWithStatus {
        let classification = classify(self.stock.expiry_date, today);
        StockWithStatus {
            listing: self,
            status: classification.status,
            days_until_expiry: classification.days_until_expiry,
        }
    }
}

/// An alert joined with its stock lot and medicine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertView {
    pub id: i64,
    pub stock_id: i64,
    pub bucket: AlertBucket,
    pub alert_day: NaiveDate,
    pub is_read: bool,
    pub created_at: String,
    pub quantity: u32,
    pub expiry_date: NaiveDate,
    pub location: Option<String>,
    pub medicine_name: String,
    pub barcode: String,
    pub active_ingredient: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    pub bucket: AlertBucket,
    pub count: i64,
    pub unread: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertStats {
    pub total: i64,
    pub unread: i64,
    pub by_bucket: Vec<BucketStats>,
}

/// Repository for reading and writing tracker data to SQLite.
#[derive(Clone)]
pub struct MedicineRepository {
    pool: SqlitePool,
}

impl MedicineRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cheap connectivity check for the health endpoint.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ---- Stock lots ----

    /// Insert a stock lot for `owner_id`.
    /// Returns `None` if the medicine does not exist or belongs to someone else.
    pub async fn insert_stock(
        &self,
        owner_id: i64,
        stock: &NewStock,
    ) -> Result<Option<StockRecord>, sqlx::Error> {
        let medicine = sqlx::query("SELECT id FROM medicines WHERE id = ? AND owner_id = ?")
            .bind(stock.medicine_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        if medicine.is_none() {
            return Ok(None);
        }

        let result = sqlx::query(
            "INSERT INTO medicine_stocks
             (owner_id, medicine_id, quantity, expiry_date, location, purchase_date, purchase_price, notes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(owner_id)
        .bind(stock.medicine_id)
        .bind(i64::from(stock.quantity))
        .bind(stock.expiry_date.to_string())
        .bind(&stock.location)
        .bind(stock.purchase_date.map(|d| d.to_string()))
        .bind(stock.purchase_price)
        .bind(&stock.notes)
        .execute(&self.pool)
        .await?;

        self.get_stock(owner_id, result.last_insert_rowid()).await
    }

    pub async fn get_stock(
        &self,
        owner_id: i64,
        stock_id: i64,
    ) -> Result<Option<StockRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM medicine_stocks ms WHERE ms.id = ? AND ms.owner_id = ?",
            STOCK_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(stock_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().and_then(stock_from_row))
    }

    /// All of an owner's stock lots, soonest expiry first.
    pub async fn list_stocks(&self, owner_id: i64) -> Result<Vec<StockListing>, sqlx::Error> {
        let sql = format!(
            "SELECT {}, m.name AS medicine_name, m.barcode, m.active_ingredient, m.manufacturer
             FROM medicine_stocks ms
             JOIN medicines m ON ms.medicine_id = m.id
             WHERE ms.owner_id = ?
             ORDER BY ms.expiry_date ASC, ms.id ASC",
            STOCK_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(owner_id).fetch_all(&self.pool).await?;

        Ok(rows.iter().filter_map(listing_from_row).collect())
    }

    /// Stock lots expiring on or before `today + days`, expired ones included.
    pub async fn list_expiring(
        &self,
        owner_id: i64,
        days: u32,
        today: NaiveDate,
    ) -> Result<Vec<StockListing>, sqlx::Error> {
        let limit = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        let sql = format!(
            "SELECT {}, m.name AS medicine_name, m.barcode, m.active_ingredient, m.manufacturer
             FROM medicine_stocks ms
             JOIN medicines m ON ms.medicine_id = m.id
             WHERE ms.owner_id = ? AND ms.expiry_date <= ?
             ORDER BY ms.expiry_date ASC, ms.id ASC",
            STOCK_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .bind(limit.to_string())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().filter_map(listing_from_row).collect())
    }

    /// Apply a partial update. Returns `None` if the lot is not the owner's.
    pub async fn update_stock(
        &self,
        owner_id: i64,
        stock_id: i64,
        update: &StockUpdate,
    ) -> Result<Option<StockRecord>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE medicine_stocks SET
                quantity       = COALESCE(?, quantity),
                expiry_date    = COALESCE(?, expiry_date),
                location       = COALESCE(?, location),
                purchase_date  = COALESCE(?, purchase_date),
                purchase_price = COALESCE(?, purchase_price),
                notes          = COALESCE(?, notes)
             WHERE id = ? AND owner_id = ?",
        )
        .bind(update.quantity.map(i64::from))
        .bind(update.expiry_date.map(|d| d.to_string()))
        .bind(&update.location)
        .bind(update.purchase_date.map(|d| d.to_string()))
        .bind(update.purchase_price)
        .bind(&update.notes)
        .bind(stock_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_stock(owner_id, stock_id).await
    }

    /// Delete a stock lot and, by cascade, its alerts.
    pub async fn delete_stock(&self, owner_id: i64, stock_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM medicine_stocks WHERE id = ? AND owner_id = ?")
            .bind(stock_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ---- Alerts ----

    /// Owner's alerts, newest first. `unread_only` hides read ones.
    pub async fn list_alerts(
        &self,
        owner_id: i64,
        unread_only: bool,
    ) -> Result<Vec<AlertView>, sqlx::Error> {
        let sql = format!(
            "SELECT ea.id, ea.stock_id, ea.bucket, ea.alert_day, ea.is_read, ea.created_at,
                    ms.quantity, ms.expiry_date, ms.location,
                    m.name AS medicine_name, m.barcode, m.active_ingredient
             FROM expiry_alerts ea
             JOIN medicine_stocks ms ON ea.stock_id = ms.id
             JOIN medicines m ON ms.medicine_id = m.id
             WHERE ea.owner_id = ? {}
             ORDER BY ea.created_at DESC, ea.id DESC",
            if unread_only { "AND ea.is_read = 0" } else { "" }
        );
        let rows = sqlx::query(&sql).bind(owner_id).fetch_all(&self.pool).await?;

        let alerts = rows
            .into_iter()
            .filter_map(|row| {
                let bucket: String = row.try_get("bucket").ok()?;
                let alert_day: String = row.try_get("alert_day").ok()?;
                let is_read: i64 = row.try_get("is_read").ok()?;
                let quantity: i64 = row.try_get("quantity").ok()?;
                let expiry_date: String = row.try_get("expiry_date").ok()?;

                Some(AlertView {
                    id: row.try_get("id").ok()?,
                    stock_id: row.try_get("stock_id").ok()?,
                    bucket: bucket.parse().ok()?,
                    alert_day: alert_day.parse().ok()?,
                    is_read: is_read != 0,
                    created_at: row.try_get("created_at").ok()?,
                    quantity: u32::try_from(quantity).ok()?,
                    expiry_date: expiry_date.parse().ok()?,
                    location: row.try_get("location").ok()?,
                    medicine_name: row.try_get("medicine_name").ok()?,
                    barcode: row.try_get("barcode").ok()?,
                    active_ingredient: row.try_get("active_ingredient").ok()?,
                })
            })
            .collect();

        Ok(alerts)
    }

    /// Returns `false` if the alert does not exist for this owner.
    pub async fn mark_alert_read(&self, owner_id: i64, alert_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE expiry_alerts SET is_read = 1 WHERE id = ? AND owner_id = ?")
            .bind(alert_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns the number of alerts that changed.
    pub async fn mark_all_alerts_read(&self, owner_id: i64) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE expiry_alerts SET is_read = 1 WHERE owner_id = ? AND is_read = 0")
                .bind(owner_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_alert(&self, owner_id: i64, alert_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM expiry_alerts WHERE id = ? AND owner_id = ?")
            .bind(alert_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn alert_stats(&self, owner_id: i64) -> Result<AlertStats, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT bucket,
                    COUNT(*) AS cnt,
                    SUM(CASE WHEN is_read = 0 THEN 1 ELSE 0 END) AS unread_cnt
             FROM expiry_alerts
             WHERE owner_id = ?
             GROUP BY bucket",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_bucket: Vec<BucketStats> = rows
            .into_iter()
            .filter_map(|row| {
                let bucket: String = row.try_get("bucket").ok()?;
                Some(BucketStats {
                    bucket: bucket.parse().ok()?,
                    count: row.try_get("cnt").ok()?,
                    unread: row.try_get("unread_cnt").ok()?,
                })
            })
            .collect();
        by_bucket.sort_by_key(|stats| stats.bucket);

        Ok(AlertStats {
            total: by_bucket.iter().map(|s| s.count).sum(),
            unread: by_bucket.iter().map(|s| s.unread).sum(),
            by_bucket,
        })
    }
}

fn stock_from_row(row: &SqliteRow) -> Option<StockRecord> {
    let quantity: i64 = row.try_get("quantity").ok()?;
    let expiry_date: String = row.try_get("expiry_date").ok()?;
    let purchase_date: Option<String> = row.try_get("purchase_date").ok()?;

    Some(StockRecord {
        id: row.try_get("id").ok()?,
        owner_id: row.try_get("owner_id").ok()?,
        medicine_id: row.try_get("medicine_id").ok()?,
        quantity: u32::try_from(quantity).ok()?,
        expiry_date: expiry_date.parse().ok()?,
        location: row.try_get("location").ok()?,
        purchase_date: purchase_date.and_then(|d| d.parse().ok()),
        purchase_price: row.try_get("purchase_price").ok()?,
        notes: row.try_get("notes").ok()?,
    })
}

fn listing_from_row(row: &SqliteRow) -> Option<StockListing> {
    Some(StockListing {
        stock: stock_from_row(row)?,
        medicine_name: row.try_get("medicine_name").ok()?,
        barcode: row.try_get("barcode").ok()?,
        active_ingredient: row.try_get("active_ingredient").ok()?,
        manufacturer: row.try_get("manufacturer").ok()?,
    })
}

fn medicine_from_row(row: &SqliteRow) -> Option<MedicineRecord> {
    Some(MedicineRecord {
        id: row.try_get("id").ok()?,
        owner_id: row.try_get("owner_id").ok()?,
        barcode: row.try_get("barcode").ok()?,
        name: row.try_get("name").ok()?,
        active_ingredient: row.try_get("active_ingredient").ok()?,
        manufacturer: row.try_get("manufacturer").ok()?,
        dosage_form: row.try_get("dosage_form").ok()?,
        strength: row.try_get("strength").ok()?,
        package_size: row.try_get("package_size").ok()?,
        description: row.try_get("description").ok()?,
        country: row.try_get("country").ok()?,
        prescription_required: row.try_get("prescription_required").ok()?,
        created_at: row.try_get("created_at").ok()?,
    })
}

#[async_trait]
impl AlertStore for MedicineRepository {
    async fn find_stocks_in_window(
        &self,
        bucket: AlertBucket,
        as_of: NaiveDate,
    ) -> Result<Vec<StockRecord>, StoreError> {
        let rows = match bucket.window(as_of) {
            ExpiryWindow::Between(start, end) => {
                let sql = format!(
                    "SELECT {} FROM medicine_stocks ms
                     WHERE ms.expiry_date BETWEEN ? AND ?
                     ORDER BY ms.expiry_date ASC, ms.id ASC",
                    STOCK_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(start.to_string())
                    .bind(end.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
            ExpiryWindow::Before(date) => {
                let sql = format!(
                    "SELECT {} FROM medicine_stocks ms
                     WHERE ms.expiry_date < ?
                     ORDER BY ms.expiry_date ASC, ms.id ASC",
                    STOCK_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(date.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.iter().filter_map(stock_from_row).collect())
    }

    async fn alert_exists_today(
        &self,
        stock_id: i64,
        bucket: AlertBucket,
        today: NaiveDate,
    ) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT 1 FROM expiry_alerts WHERE stock_id = ? AND bucket = ? AND alert_day = ?",
        )
        .bind(stock_id)
        .bind(bucket.as_str())
        .bind(today.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn insert_alert(
        &self,
        stock_id: i64,
        bucket: AlertBucket,
        today: NaiveDate,
    ) -> Result<Option<i64>, StoreError> {
        let result = sqlx::query(
            "INSERT INTO expiry_alerts (stock_id, owner_id, bucket, alert_day, created_at)
             SELECT id, owner_id, ?, ?, ? FROM medicine_stocks WHERE id = ?",
        )
        .bind(bucket.as_str())
        .bind(today.to_string())
        .bind(Utc::now().to_rfc3339())
        .bind(stock_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(result.last_insert_rowid()))
    }
}

#[async_trait]
impl MedicineStore for MedicineRepository {
    async fn find_medicine(
        &self,
        owner_id: i64,
        barcode: &str,
    ) -> Result<Option<MedicineRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM medicines WHERE owner_id = ? AND barcode = ?",
            MEDICINE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(owner_id)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().and_then(medicine_from_row))
    }

    async fn insert_medicine(
        &self,
        owner_id: i64,
        medicine: &NewMedicine,
    ) -> Result<MedicineRecord, StoreError> {
        let result = sqlx::query(
            "INSERT INTO medicines
             (owner_id, barcode, name, active_ingredient, manufacturer, dosage_form,
              strength, package_size, description, country, prescription_required)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(owner_id)
        .bind(&medicine.barcode)
        .bind(&medicine.name)
        .bind(&medicine.active_ingredient)
        .bind(&medicine.manufacturer)
        .bind(&medicine.dosage_form)
        .bind(&medicine.strength)
        .bind(&medicine.package_size)
        .bind(&medicine.description)
        .bind(&medicine.country)
        .bind(medicine.prescription_required)
        .execute(&self.pool)
        .await?;

        let sql = format!("SELECT {} FROM medicines WHERE id = ?", MEDICINE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(result.last_insert_rowid())
            .fetch_one(&self.pool)
            .await?;

        medicine_from_row(&row).ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }
}
