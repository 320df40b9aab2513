//! # Cash Ledger
//!
//! Public surface over the three cash channels. Sale commits write to the
//! channels from inside the sale transaction; this module covers the read
//! side and the manual adjustment workflow (drawer counts, owner draws,
//! refund corrections after a cancellation).
//!
//! Amounts are always positive; the direction carries the sign. Balances
//! may legitimately go negative through removal; the ledger never blocks an
//! adjustment, it only records it.

use chrono::Utc;
use tracing::info;

use benta_core::{CashBalances, CashChannel, CashDirection, CashTransaction, ValidationError};
use benta_store::Store;

use crate::error::EngineResult;

/// Per-channel amounts for a manual adjustment. `None` skips a channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct CashAmounts {
    pub cash_cents: Option<i64>,
    pub gcash_cents: Option<i64>,
    pub paymaya_cents: Option<i64>,
}

impl CashAmounts {
    fn get(&self, channel: CashChannel) -> Option<i64> {
        match channel {
            CashChannel::Cash => self.cash_cents,
            CashChannel::Gcash => self.gcash_cents,
            CashChannel::Paymaya => self.paymaya_cents,
        }
    }
}

/// Read and manual-adjustment operations on the cash channels.
#[derive(Debug, Clone)]
pub struct CashLedger {
    store: Store,
}

impl CashLedger {
    pub fn new(store: Store) -> Self {
        CashLedger { store }
    }

    /// Current channel balances.
    pub async fn balances(&self) -> EngineResult<CashBalances> {
        Ok(self.store.cash().balances().await?)
    }

    /// Recent transactions across all channels, newest first.
    pub async fn transactions(&self, limit: i64) -> EngineResult<Vec<CashTransaction>> {
        Ok(self.store.cash().transactions(limit).await?)
    }

    /// Applies one signed transaction to one channel and returns the updated
    /// balances. A remove of a negative amount is invalid input, not a sign
    /// flip.
    pub async fn apply_transaction(
        &self,
        channel: CashChannel,
        direction: CashDirection,
        amount_cents: i64,
        reason: &str,
        reference_sale_id: Option<&str>,
    ) -> EngineResult<CashBalances> {
        validate_adjustment(amount_cents, reason)?;

        let mut tx = self.store.begin().await?;
        self.store
            .cash()
            .apply_tx(
                &mut tx,
                channel,
                direction,
                amount_cents,
                reason.trim(),
                reference_sale_id,
                Utc::now(),
            )
            .await?;
        let balances = self.store.cash().balances_tx(&mut tx).await?;
        tx.commit().await.map_err(benta_store::StoreError::from)?;

        info!(channel = %channel, direction = direction.as_str(), amount_cents, "Cash transaction applied");
        Ok(balances)
    }

    /// Applies one manual adjustment across channels. Each supplied non-zero
    /// amount becomes an independent log entry sharing the same direction,
    /// reason, and reference.
    pub async fn apply_manual_update(
        &self,
        amounts: CashAmounts,
        direction: CashDirection,
        reason: &str,
        reference: Option<&str>,
    ) -> EngineResult<CashBalances> {
        if reason.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "description".to_string(),
            }
            .into());
        }

        let mut tx = self.store.begin().await?;
        let now = Utc::now();

        for channel in CashChannel::ALL {
            let Some(amount_cents) = amounts.get(channel) else {
                continue;
            };
            if amount_cents == 0 {
                continue;
            }
            validate_adjustment(amount_cents, reason)?;

            self.store
                .cash()
                .apply_tx(
                    &mut tx,
                    channel,
                    direction,
                    amount_cents,
                    reason.trim(),
                    reference,
                    now,
                )
                .await?;

            info!(channel = %channel, direction = direction.as_str(), amount_cents, "Manual cash adjustment");
        }

        let updated = self.store.cash().balances_tx(&mut tx).await?;
        tx.commit().await.map_err(benta_store::StoreError::from)?;

        Ok(updated)
    }
}

fn validate_adjustment(amount_cents: i64, reason: &str) -> EngineResult<()> {
    if amount_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        }
        .into());
    }
    if reason.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        }
        .into());
    }
    Ok(())
}
