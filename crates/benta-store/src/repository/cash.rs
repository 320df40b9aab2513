//! # Cash Channel Repository
//!
//! Database operations for the three cash channels and their transaction log.
//!
//! Every balance change pairs an UPDATE on `cash_channels` with an INSERT
//! into `cash_transactions`, inside the caller's transaction, so the
//! invariant `balance == signed sum of log entries` holds at every commit
//! point.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use benta_core::{CashBalances, CashChannel, CashDirection, CashTransaction};

#[derive(Debug, sqlx::FromRow)]
struct ChannelRow {
    channel: String,
    balance_cents: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    channel: String,
    direction: String,
    amount_cents: i64,
    reason: String,
    reference_sale_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for CashTransaction {
    type Error = StoreError;

    fn try_from(r: TransactionRow) -> Result<Self, Self::Error> {
        Ok(CashTransaction {
            id: r.id,
            channel: CashChannel::from_str(&r.channel).map_err(StoreError::Corrupt)?,
            direction: CashDirection::from_str(&r.direction).map_err(StoreError::Corrupt)?,
            amount_cents: r.amount_cents,
            reason: r.reason,
            reference_sale_id: r.reference_sale_id,
            created_at: r.created_at,
        })
    }
}

/// Repository for cash channel operations.
#[derive(Debug, Clone)]
pub struct CashRepository {
    pool: SqlitePool,
}

impl CashRepository {
    /// Creates a new CashRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashRepository { pool }
    }

    /// Current balances of all three channels.
    pub async fn balances(&self) -> StoreResult<CashBalances> {
        let rows: Vec<ChannelRow> =
            sqlx::query_as("SELECT channel, balance_cents FROM cash_channels")
                .fetch_all(&self.pool)
                .await?;

        Self::fold_balances(rows)
    }

    /// Balances inside the caller's transaction.
    pub async fn balances_tx(&self, conn: &mut SqliteConnection) -> StoreResult<CashBalances> {
        let rows: Vec<ChannelRow> =
            sqlx::query_as("SELECT channel, balance_cents FROM cash_channels")
                .fetch_all(&mut *conn)
                .await?;

        Self::fold_balances(rows)
    }

    fn fold_balances(rows: Vec<ChannelRow>) -> StoreResult<CashBalances> {
        let mut balances = CashBalances::default();
        for row in rows {
            match CashChannel::from_str(&row.channel).map_err(StoreError::Corrupt)? {
                CashChannel::Cash => balances.cash_cents = row.balance_cents,
                CashChannel::Gcash => balances.gcash_cents = row.balance_cents,
                CashChannel::Paymaya => balances.paymaya_cents = row.balance_cents,
            }
        }
        Ok(balances)
    }

    /// Applies a signed balance change and logs it, inside the caller's
    /// transaction. `amount_cents` must be positive; the direction carries
    /// the sign.
    pub async fn apply_tx(
        &self,
        conn: &mut SqliteConnection,
        channel: CashChannel,
        direction: CashDirection,
        amount_cents: i64,
        reason: &str,
        reference_sale_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        debug!(
            channel = %channel,
            direction = direction.as_str(),
            amount_cents,
            "Applying cash transaction"
        );

        sqlx::query(
            "UPDATE cash_channels SET balance_cents = balance_cents + ?2 WHERE channel = ?1",
        )
        .bind(channel.as_str())
        .bind(direction.signed(amount_cents))
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO cash_transactions (
                id, channel, direction, amount_cents, reason, reference_sale_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(channel.as_str())
        .bind(direction.as_str())
        .bind(amount_cents)
        .bind(reason)
        .bind(reference_sale_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Most recent transactions across all channels.
    pub async fn transactions(&self, limit: i64) -> StoreResult<Vec<CashTransaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            "SELECT id, channel, direction, amount_cents, reason, reference_sale_id, created_at \
             FROM cash_transactions ORDER BY created_at DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CashTransaction::try_from).collect()
    }
}
