//! # Sale Repository
//!
//! Database operations for sales, sale lines, status transitions, and the
//! analytics reads built on them.
//!
//! ## Guarded Transitions
//! Status changes are single UPDATEs with the old status in the WHERE
//! clause; `rows_affected() == 0` means the sale was not in the expected
//! state and the engine maps that to the right domain error. Two racing
//! cancellations can never both succeed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use std::str::FromStr;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use benta_core::{PaymentMethod, Sale, SaleLine, SaleStatus};

const SALE_COLUMNS: &str = "id, total_cents, payment_method, customer_name, status, \
     created_at, paid_at, cancelled_at, cancellation_reason";

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    total_cents: i64,
    payment_method: String,
    customer_name: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
}

impl TryFrom<SaleRow> for Sale {
    type Error = StoreError;

    fn try_from(r: SaleRow) -> Result<Self, Self::Error> {
        Ok(Sale {
            id: r.id,
            total_cents: r.total_cents,
            payment_method: PaymentMethod::from_str(&r.payment_method)
                .map_err(StoreError::Corrupt)?,
            customer_name: r.customer_name,
            status: SaleStatus::from_str(&r.status).map_err(StoreError::Corrupt)?,
            created_at: r.created_at,
            paid_at: r.paid_at,
            cancelled_at: r.cancelled_at,
            cancellation_reason: r.cancellation_reason,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: String,
    sale_id: String,
    product_id: String,
    name_snapshot: String,
    unit_price_cents: i64,
    quantity: i64,
    line_total_cents: i64,
}

impl From<LineRow> for SaleLine {
    fn from(r: LineRow) -> Self {
        SaleLine {
            id: r.id,
            sale_id: r.sale_id,
            product_id: r.product_id,
            name_snapshot: r.name_snapshot,
            unit_price_cents: r.unit_price_cents,
            quantity: r.quantity,
            line_total_cents: r.line_total_cents,
        }
    }
}

/// A top-selling product aggregated over non-cancelled sales.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Bestseller {
    pub product_id: String,
    pub name: String,
    pub total_quantity: i64,
    pub total_cents: i64,
}

/// Aggregate revenue figures for a time window.
#[derive(Debug, Clone, Copy, Default, Serialize, sqlx::FromRow)]
pub struct SalesSummary {
    pub revenue_cents: i64,
    pub sale_count: i64,
    pub items_sold: i64,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts the sale header inside the caller's transaction.
    pub async fn insert_sale_tx(&self, conn: &mut SqliteConnection, sale: &Sale) -> StoreResult<()> {
        debug!(id = %sale.id, total_cents = sale.total_cents, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, total_cents, payment_method, customer_name, status,
                created_at, paid_at, cancelled_at, cancellation_reason
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.total_cents)
        .bind(sale.payment_method.as_str())
        .bind(&sale.customer_name)
        .bind(sale.status.as_str())
        .bind(sale.created_at)
        .bind(sale.paid_at)
        .bind(sale.cancelled_at)
        .bind(&sale.cancellation_reason)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts one sale line inside the caller's transaction.
    pub async fn insert_line_tx(&self, conn: &mut SqliteConnection, line: &SaleLine) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_lines (
                id, sale_id, product_id, name_snapshot,
                unit_price_cents, quantity, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&line.id)
        .bind(&line.sale_id)
        .bind(&line.product_id)
        .bind(&line.name_snapshot)
        .bind(line.unit_price_cents)
        .bind(line.quantity)
        .bind(line.line_total_cents)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a sale by id.
    pub async fn get(&self, id: &str) -> StoreResult<Option<Sale>> {
        let row: Option<SaleRow> =
            sqlx::query_as(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Sale::try_from).transpose()
    }

    /// Gets a sale by id inside the caller's transaction.
    pub async fn get_tx(&self, conn: &mut SqliteConnection, id: &str) -> StoreResult<Option<Sale>> {
        let row: Option<SaleRow> =
            sqlx::query_as(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        row.map(Sale::try_from).transpose()
    }

    /// Lines of one sale, insertion order.
    pub async fn lines(&self, sale_id: &str) -> StoreResult<Vec<SaleLine>> {
        let rows: Vec<LineRow> = sqlx::query_as(
            "SELECT id, sale_id, product_id, name_snapshot, unit_price_cents, \
             quantity, line_total_cents FROM sale_lines WHERE sale_id = ?1",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SaleLine::from).collect())
    }

    /// Lines of one sale inside the caller's transaction.
    pub async fn lines_tx(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> StoreResult<Vec<SaleLine>> {
        let rows: Vec<LineRow> = sqlx::query_as(
            "SELECT id, sale_id, product_id, name_snapshot, unit_price_cents, \
             quantity, line_total_cents FROM sale_lines WHERE sale_id = ?1",
        )
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(SaleLine::from).collect())
    }

    /// All sales, newest first.
    pub async fn list(&self) -> StoreResult<Vec<Sale>> {
        let rows: Vec<SaleRow> = sqlx::query_as(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Sale::try_from).collect()
    }

    /// All sale lines, for building the sales-with-lines detail view.
    pub async fn all_lines(&self) -> StoreResult<Vec<SaleLine>> {
        let rows: Vec<LineRow> = sqlx::query_as(
            "SELECT id, sale_id, product_id, name_snapshot, unit_price_cents, \
             quantity, line_total_cents FROM sale_lines",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SaleLine::from).collect())
    }

    /// Marks an unpaid sale as paid. Returns affected row count: 0 means the
    /// sale was not in `unpaid` status (or does not exist).
    pub async fn mark_paid_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        paid_at: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE sales SET status = 'completed', paid_at = ?2 \
             WHERE id = ?1 AND status = 'unpaid'",
        )
        .bind(id)
        .bind(paid_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Cancels a sale. Returns affected row count: 0 means it was already
    /// cancelled (or does not exist).
    pub async fn cancel_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        reason: &str,
        cancelled_at: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE sales SET status = 'cancelled', cancelled_at = ?2, cancellation_reason = ?3 \
             WHERE id = ?1 AND status IN ('completed', 'unpaid')",
        )
        .bind(id)
        .bind(cancelled_at)
        .bind(reason)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Top sellers by units sold, cancelled sales excluded.
    pub async fn bestsellers(&self, limit: i64) -> StoreResult<Vec<Bestseller>> {
        let rows: Vec<Bestseller> = sqlx::query_as(
            r#"
            SELECT
                l.product_id          AS product_id,
                l.name_snapshot       AS name,
                SUM(l.quantity)       AS total_quantity,
                SUM(l.line_total_cents) AS total_cents
            FROM sale_lines l
            JOIN sales s ON s.id = l.sale_id
            WHERE s.status != 'cancelled'
            GROUP BY l.product_id, l.name_snapshot
            ORDER BY total_quantity DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Revenue, sale count, and units sold since `since`, cancelled excluded.
    pub async fn summary_since(&self, since: DateTime<Utc>) -> StoreResult<SalesSummary> {
        let summary: SalesSummary = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(s.total_cents), 0) AS revenue_cents,
                COUNT(s.id)                     AS sale_count,
                COALESCE((
                    SELECT SUM(l.quantity)
                    FROM sale_lines l
                    JOIN sales s2 ON s2.id = l.sale_id
                    WHERE s2.status != 'cancelled' AND s2.created_at >= ?1
                ), 0)                           AS items_sold
            FROM sales s
            WHERE s.status != 'cancelled' AND s.created_at >= ?1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }
}
