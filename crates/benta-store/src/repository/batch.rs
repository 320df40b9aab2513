//! # Expiration Batch Repository
//!
//! Database operations for expiration batches.
//!
//! Batches are a partial breakdown of a product's stock by expiration date.
//! The invariant `SUM(batch.quantity) <= product.quantity` is enforced by the
//! engine; this module only provides the primitives (upsert, reduce, trim).

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreResult;
use benta_core::{ExpirationBatch, ExpiringStock};

#[derive(Debug, sqlx::FromRow)]
struct BatchRow {
    id: String,
    product_id: String,
    expiration_date: NaiveDate,
    quantity: i64,
}

impl From<BatchRow> for ExpirationBatch {
    fn from(r: BatchRow) -> Self {
        ExpirationBatch {
            id: r.id,
            product_id: r.product_id,
            expiration_date: r.expiration_date,
            quantity: r.quantity,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ExpiringRow {
    product_id: String,
    product_name: String,
    product_quantity: i64,
    expiration_date: NaiveDate,
    quantity: i64,
}

/// Repository for expiration batch operations.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// All batches for one product, earliest expiration first.
    pub async fn for_product(&self, product_id: &str) -> StoreResult<Vec<ExpirationBatch>> {
        let rows: Vec<BatchRow> = sqlx::query_as(
            "SELECT id, product_id, expiration_date, quantity \
             FROM product_batches WHERE product_id = ?1 ORDER BY expiration_date",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ExpirationBatch::from).collect())
    }

    /// Batches expiring on or before `cutoff`, joined with their product.
    ///
    /// Only active products with stock in the batch are reported.
    pub async fn near_expiration(&self, cutoff: NaiveDate) -> StoreResult<Vec<ExpiringStock>> {
        let rows: Vec<ExpiringRow> = sqlx::query_as(
            r#"
            SELECT
                b.product_id        AS product_id,
                p.name              AS product_name,
                p.quantity          AS product_quantity,
                b.expiration_date   AS expiration_date,
                b.quantity          AS quantity
            FROM product_batches b
            JOIN products p ON p.id = b.product_id
            WHERE b.expiration_date <= ?1
              AND b.quantity > 0
              AND p.is_active = 1
            ORDER BY b.expiration_date, p.name
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ExpiringStock {
                product_id: r.product_id,
                product_name: r.product_name,
                product_quantity: r.product_quantity,
                expiration_date: r.expiration_date,
                quantity: r.quantity,
            })
            .collect())
    }

    /// Looks up one batch by its natural key inside the caller's transaction.
    pub async fn get_tx(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        expiration_date: NaiveDate,
    ) -> StoreResult<Option<ExpirationBatch>> {
        let row: Option<BatchRow> = sqlx::query_as(
            "SELECT id, product_id, expiration_date, quantity \
             FROM product_batches WHERE product_id = ?1 AND expiration_date = ?2",
        )
        .bind(product_id)
        .bind(expiration_date)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(ExpirationBatch::from))
    }

    /// Adds `quantity` to the batch for (product, date), creating it if absent.
    pub async fn upsert_add_tx(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        expiration_date: NaiveDate,
        quantity: i64,
    ) -> StoreResult<()> {
        debug!(product_id = %product_id, %expiration_date, quantity, "Upserting batch");

        sqlx::query(
            r#"
            INSERT INTO product_batches (id, product_id, expiration_date, quantity)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (product_id, expiration_date)
            DO UPDATE SET quantity = quantity + excluded.quantity
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(product_id)
        .bind(expiration_date)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Reduces a batch by `quantity`, deleting the row if it hits zero.
    pub async fn reduce_tx(
        &self,
        conn: &mut SqliteConnection,
        batch_id: &str,
        quantity: i64,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE product_batches SET quantity = quantity - ?2 WHERE id = ?1")
            .bind(batch_id)
            .bind(quantity)
            .execute(&mut *conn)
            .await?;

        sqlx::query("DELETE FROM product_batches WHERE id = ?1 AND quantity <= 0")
            .bind(batch_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Deletes a batch row outright (alert cleared, stock untouched).
    pub async fn delete_tx(&self, conn: &mut SqliteConnection, batch_id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM product_batches WHERE id = ?1")
            .bind(batch_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Sum of batch quantities for one product inside the caller's transaction.
    pub async fn sum_for_product_tx(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> StoreResult<i64> {
        let sum: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(quantity) FROM product_batches WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(sum.unwrap_or(0))
    }

    /// Trims batches FEFO (first-expired-first-out) until their sum is at
    /// most `max_total`. Called after a stock decrement to restore the
    /// `SUM(batches) <= product.quantity` invariant.
    pub async fn trim_to_total_tx(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        max_total: i64,
    ) -> StoreResult<()> {
        let mut excess = self.sum_for_product_tx(conn, product_id).await? - max_total;
        if excess <= 0 {
            return Ok(());
        }

        debug!(product_id = %product_id, excess, "Trimming batches to stock total");

        let rows: Vec<BatchRow> = sqlx::query_as(
            "SELECT id, product_id, expiration_date, quantity \
             FROM product_batches WHERE product_id = ?1 ORDER BY expiration_date",
        )
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await?;

        for row in rows {
            if excess <= 0 {
                break;
            }
            let take = excess.min(row.quantity);
            self.reduce_tx(conn, &row.id, take).await?;
            excess -= take;
        }

        Ok(())
    }
}
