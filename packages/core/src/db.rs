//! SQLite pool bootstrap.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Open (creating if needed) the database at `database_url` and apply the
/// embedded migrations.
///
/// `sqlite::memory:` gets a single long-lived connection, since every new
/// connection would otherwise see its own empty database.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options.connect_with(options).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::debug!("Database ready at {}", database_url);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn memory_pool_has_schema() {
        let pool = create_pool("sqlite::memory:").await.unwrap();

        let row = sqlx::query(
            "SELECT COUNT(*) AS cnt FROM sqlite_master
             WHERE type = 'table' AND name IN ('medicines', 'medicine_stocks', 'expiry_alerts')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        let count: i64 = row.try_get("cnt").unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let pool = create_pool("sqlite::memory:").await.unwrap();

        let result = sqlx::query(
            "INSERT INTO medicine_stocks (owner_id, medicine_id, quantity, expiry_date)
             VALUES (1, 999, 1, '2030-01-01')",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err());
    }
}
