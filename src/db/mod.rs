//! This module is responsible for reading, writing and managing the SQLite database.
//!
//! There is one connection for the whole process. Every statement goes through it in turn, which
//! is what keeps the one-record-per-date rule intact without any further locking.

mod migrations;

use crate::model::{PriceRecord, ProductionRecord, RevenueRow, SalesRecord, Stored};
use crate::error::Res;
use anyhow::Context;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::path::Path;
use tracing::{debug, trace};

/// The schema version this build of the program expects.
pub(crate) const CURRENT_VERSION: i32 = 1;

/// The three record tables.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Production,
    Prices,
    Sales,
}

serde_plain::derive_display_from_serialize!(Table);
serde_plain::derive_fromstr_from_deserialize!(Table);

impl Table {
    pub const ALL: [Table; 3] = [Table::Production, Table::Prices, Table::Sales];

    /// The SQL table name.
    pub fn table_name(&self) -> &'static str {
        match self {
            Table::Production => "egg_production",
            Table::Prices => "egg_prices",
            Table::Sales => "sales",
        }
    }

    /// The name of the sheet this table is exported to.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            Table::Production => "Egg Production",
            Table::Prices => "Egg Prices",
            Table::Sales => "Sales",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Creates the SQLite file at `path` if it does not exist
    /// - Creates a single-connection client
    /// - Brings the schema up to `CURRENT_VERSION`, which is a no-op on an up-to-date file
    pub(crate) async fn open(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        debug!("Opening SQLite database at {}", path.display());
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Unable to open SQLite database at {}", path.display()))?;

        let db = Self { pool };
        let current = db.schema_version().await?;
        migrations::run(&db.pool, current, CURRENT_VERSION).await?;
        Ok(db)
    }

    /// Closes the connection. Further calls on this `Db` (or its clones) will fail.
    pub(crate) async fn close(&self) {
        self.pool.close().await;
    }

    /// Reads the schema version, creating the bookkeeping table at version 0 on a fresh file.
    async fn schema_version(&self) -> Res<i32> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await
            .context("Failed to create schema_version table")?;

        let row: (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&self.pool)
            .await
            .context("Failed to query schema version")?;

        match row.0 {
            Some(version) => Ok(version),
            None => {
                sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
                    .execute(&self.pool)
                    .await
                    .context("Failed to insert initial schema version")?;
                Ok(0)
            }
        }
    }

    // =========================================================================
    // Upserts
    // =========================================================================
    //
    // Each upsert writes and reads the row back inside one transaction. If the row cannot be
    // read back as a record, the transaction is dropped and the write is rolled back.

    /// Inserts or replaces the production record for `date`. Values are bound as text so the
    /// store performs the type checks.
    pub(crate) async fn upsert_production(
        &self,
        date: &str,
        egg_type: &str,
        quantity: &str,
    ) -> Res<Stored<ProductionRecord>> {
        trace!("upsert_production({date}, {egg_type}, {quantity})");
        let mut tx = self.begin().await?;
        sqlx::query(
            "INSERT INTO egg_production (date, type, production) VALUES (?, ?, ?) \
             ON CONFLICT(date) DO UPDATE SET type = excluded.type, production = excluded.production",
        )
        .bind(date)
        .bind(egg_type)
        .bind(quantity)
        .execute(&mut *tx)
        .await
        .context("Error adding production entry")?;

        let stored = production_for(&mut tx, date)
            .await?
            .with_context(|| format!("Production entry for '{date}' missing after write"))?;
        commit(tx).await?;
        Ok(stored)
    }

    /// Inserts or replaces the price record for `date`. A price the store accepts but that cannot
    /// be read back as a `Decimal` is not kept.
    pub(crate) async fn upsert_price(&self, date: &str, price: &str) -> Res<Stored<PriceRecord>> {
        trace!("upsert_price({date}, {price})");
        let mut tx = self.begin().await?;
        sqlx::query(
            "INSERT INTO egg_prices (date, price) VALUES (?, ?) \
             ON CONFLICT(date) DO UPDATE SET price = excluded.price",
        )
        .bind(date)
        .bind(price)
        .execute(&mut *tx)
        .await
        .context("Error adding price entry")?;

        let stored = price_for(&mut tx, date)
            .await
            .context("Error adding price entry")?
            .with_context(|| format!("Price entry for '{date}' missing after write"))?;
        commit(tx).await?;
        Ok(stored)
    }

    /// Inserts or replaces the sales record for `date`.
    pub(crate) async fn upsert_sales(&self, date: &str, quantity: &str) -> Res<Stored<SalesRecord>> {
        trace!("upsert_sales({date}, {quantity})");
        let mut tx = self.begin().await?;
        sqlx::query(
            "INSERT INTO sales (date, quantity) VALUES (?, ?) \
             ON CONFLICT(date) DO UPDATE SET quantity = excluded.quantity",
        )
        .bind(date)
        .bind(quantity)
        .execute(&mut *tx)
        .await
        .context("Error adding sales entry")?;

        let stored = sales_for(&mut tx, date)
            .await?
            .with_context(|| format!("Sales entry for '{date}' missing after write"))?;
        commit(tx).await?;
        Ok(stored)
    }

    async fn begin(&self) -> Res<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .context("Failed to begin transaction")
    }

    // =========================================================================
    // Full-table reads, in insertion order
    // =========================================================================

    pub(crate) async fn production_rows(&self) -> Res<Vec<Stored<ProductionRecord>>> {
        let rows: Vec<(i64, String, String, i64)> =
            sqlx::query_as("SELECT id, date, type, production FROM egg_production ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .context("Failed to read production entries")?;
        Ok(rows.into_iter().map(production_from_row).collect())
    }

    pub(crate) async fn price_rows(&self) -> Res<Vec<Stored<PriceRecord>>> {
        let rows: Vec<(i64, String, f64)> =
            sqlx::query_as("SELECT id, date, price FROM egg_prices ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .context("Failed to read price entries")?;
        rows.into_iter().map(price_from_row).collect()
    }

    pub(crate) async fn sales_rows(&self) -> Res<Vec<Stored<SalesRecord>>> {
        let rows: Vec<(i64, String, i64)> =
            sqlx::query_as("SELECT id, date, quantity FROM sales ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .context("Failed to read sales entries")?;
        Ok(rows.into_iter().map(sales_from_row).collect())
    }

    /// Every production date, left-joined with the sales and price of the same date.
    pub(crate) async fn revenue_rows(&self) -> Res<Vec<RevenueRow>> {
        let rows: Vec<(String, i64, Option<i64>, Option<f64>)> = sqlx::query_as(
            "SELECT ep.date, ep.production, s.quantity, p.price \
             FROM egg_production ep \
             LEFT JOIN sales s ON ep.date = s.date \
             LEFT JOIN egg_prices p ON ep.date = p.date \
             ORDER BY ep.id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to read revenue data")?;

        rows.into_iter()
            .map(|(date, production, sales, price)| -> Res<RevenueRow> {
                let price = price.map(to_decimal).transpose()?;
                RevenueRow::new(date, production, sales, price)
            })
            .collect()
    }

    /// Returns the number of rows in `table`.
    #[cfg(test)]
    pub(crate) async fn count_rows(&self, table: Table) -> Res<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.table_name());
        let row: (i64,) = sqlx::query_as(&sql)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count rows in {}", table.table_name()))?;
        Ok(u64::try_from(row.0).unwrap_or_default())
    }
}

async fn commit(tx: Transaction<'static, Sqlite>) -> Res<()> {
    tx.commit().await.context("Failed to commit transaction")
}

async fn production_for(
    conn: &mut SqliteConnection,
    date: &str,
) -> Res<Option<Stored<ProductionRecord>>> {
    let row: Option<(i64, String, String, i64)> =
        sqlx::query_as("SELECT id, date, type, production FROM egg_production WHERE date = ?")
            .bind(date)
            .fetch_optional(conn)
            .await
            .context("Failed to query production entry")?;
    Ok(row.map(production_from_row))
}

async fn price_for(conn: &mut SqliteConnection, date: &str) -> Res<Option<Stored<PriceRecord>>> {
    let row: Option<(i64, String, f64)> =
        sqlx::query_as("SELECT id, date, price FROM egg_prices WHERE date = ?")
            .bind(date)
            .fetch_optional(conn)
            .await
            .context("Failed to query price entry")?;
    row.map(price_from_row).transpose()
}

async fn sales_for(conn: &mut SqliteConnection, date: &str) -> Res<Option<Stored<SalesRecord>>> {
    let row: Option<(i64, String, i64)> =
        sqlx::query_as("SELECT id, date, quantity FROM sales WHERE date = ?")
            .bind(date)
            .fetch_optional(conn)
            .await
            .context("Failed to query sales entry")?;
    Ok(row.map(sales_from_row))
}

fn production_from_row(row: (i64, String, String, i64)) -> Stored<ProductionRecord> {
    let (id, date, egg_type, quantity) = row;
    Stored::new(id, ProductionRecord::new(date, egg_type, quantity))
}

fn price_from_row(row: (i64, String, f64)) -> Res<Stored<PriceRecord>> {
    let (id, date, price) = row;
    Ok(Stored::new(id, PriceRecord::new(date, to_decimal(price)?)))
}

fn sales_from_row(row: (i64, String, i64)) -> Stored<SalesRecord> {
    let (id, date, quantity) = row;
    Stored::new(id, SalesRecord::new(date, quantity))
}

fn to_decimal(value: f64) -> Res<Decimal> {
    Decimal::from_f64(value).with_context(|| format!("Price {value} cannot be represented"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_temp() -> (TempDir, Db) {
        let dir = TempDir::new().unwrap();
        let db = Db::open(dir.path().join("test.sqlite")).await.unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("poultry.sqlite");
        let db = Db::open(&path).await.unwrap();
        assert_eq!(db.schema_version().await.unwrap(), CURRENT_VERSION);
        db.close().await;

        let db = Db::open(&path).await.unwrap();
        assert_eq!(db.schema_version().await.unwrap(), CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_reopen_preserves_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("poultry.sqlite");

        let db = Db::open(&path).await.unwrap();
        db.upsert_production("2024-01-01", "A", "10").await.unwrap();
        db.upsert_price("2024-01-01", "2.5").await.unwrap();
        db.upsert_sales("2024-01-01", "8").await.unwrap();
        db.close().await;

        let db = Db::open(&path).await.unwrap();
        let production = db.production_rows().await.unwrap();
        assert_eq!(production.len(), 1);
        assert_eq!(
            production[0].record,
            ProductionRecord::new("2024-01-01", "A", 10)
        );
        assert_eq!(db.count_rows(Table::Prices).await.unwrap(), 1);
        assert_eq!(db.count_rows(Table::Sales).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_keeps_id() {
        let (_dir, db) = open_temp().await;
        let first = db.upsert_production("2024-01-01", "A", "10").await.unwrap();
        let second = db.upsert_production("2024-01-01", "C", "3").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.record, ProductionRecord::new("2024-01-01", "C", 3));
        assert_eq!(db.count_rows(Table::Production).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_price_and_sales_replace() {
        let (_dir, db) = open_temp().await;
        db.upsert_price("2024-01-01", "2.5").await.unwrap();
        let price = db.upsert_price("2024-01-01", "3").await.unwrap();
        assert_eq!(price.record.price, Decimal::from(3));

        db.upsert_sales("2024-01-01", "5").await.unwrap();
        let sales = db.upsert_sales("2024-01-01", "9").await.unwrap();
        assert_eq!(sales.record.quantity, 9);

        assert_eq!(db.count_rows(Table::Prices).await.unwrap(), 1);
        assert_eq!(db.count_rows(Table::Sales).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_store_rejects_bad_values() {
        let (_dir, db) = open_temp().await;
        assert!(db.upsert_production("2024-01-01", "A", "many").await.is_err());
        assert!(db.upsert_production("2024-01-01", "A", "-1").await.is_err());
        assert!(db.upsert_price("2024-01-01", "cheap").await.is_err());
        assert!(db.upsert_sales("2024-01-01", "1.5").await.is_err());
        for table in Table::ALL {
            assert_eq!(db.count_rows(table).await.unwrap(), 0);
        }
    }

    #[tokio::test]
    async fn test_unreadable_price_is_rolled_back() {
        let (_dir, db) = open_temp().await;
        db.upsert_price("2024-01-01", "2.5").await.unwrap();

        let err = db.upsert_price("2024-01-02", "1e30").await.unwrap_err();
        assert!(format!("{err:#}").contains("cannot be represented"));
        let err = db.upsert_price("2024-01-01", "1e30").await.unwrap_err();
        assert!(format!("{err:#}").contains("cannot be represented"));

        assert_eq!(db.count_rows(Table::Prices).await.unwrap(), 1);
        let prices = db.price_rows().await.unwrap();
        assert_eq!(prices[0].record.price, Decimal::new(25, 1));
    }

    #[tokio::test]
    async fn test_rows_follow_insertion_order() {
        let (_dir, db) = open_temp().await;
        db.upsert_sales("2024-01-03", "1").await.unwrap();
        db.upsert_sales("2024-01-01", "2").await.unwrap();
        db.upsert_sales("2024-01-02", "3").await.unwrap();
        let dates: Vec<String> = db
            .sales_rows()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.record.date)
            .collect();
        assert_eq!(dates, vec!["2024-01-03", "2024-01-01", "2024-01-02"]);
    }

    #[tokio::test]
    async fn test_revenue_rows() {
        let (_dir, db) = open_temp().await;
        db.upsert_production("2024-01-01", "A", "10").await.unwrap();
        db.upsert_production("2024-01-02", "B", "4").await.unwrap();
        db.upsert_price("2024-01-01", "2.5").await.unwrap();
        db.upsert_sales("2024-01-01", "6").await.unwrap();
        // A price with no production on that date does not produce a revenue row.
        db.upsert_price("2024-02-01", "9").await.unwrap();

        let rows = db.revenue_rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2024-01-01");
        assert_eq!(rows[0].sales, Some(6));
        assert_eq!(rows[0].revenue, Decimal::new(250, 1));
        assert_eq!(rows[1].date, "2024-01-02");
        assert_eq!(rows[1].price, None);
        assert_eq!(rows[1].revenue, Decimal::ZERO);
    }

    #[test]
    fn test_table_names() {
        assert_eq!(Table::Production.table_name(), "egg_production");
        assert_eq!(Table::Prices.sheet_name(), "Egg Prices");
        assert_eq!(Table::Sales.to_string(), "sales");
    }
}
