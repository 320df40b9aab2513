//! # Expiration Watch
//!
//! Near-expiration alerts and their resolution.
//!
//! A batch is a quantity of a product tagged with an expiration date.
//! When a batch comes within the alert horizon the operator decides:
//!
//! - **Pull**: the units come off the shelf. Stock decrements, the batch
//!   shrinks, and an `expiration-pull` movement is logged.
//! - **Clear**: the alert was a false positive (product still good, date
//!   entered wrong, already handled). The batch row is deleted; stock is
//!   untouched.

use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use benta_core::{ExpiringStock, MovementReason, StockMovement};
use benta_store::Store;

use crate::error::{EngineError, EngineResult};
use crate::locks::ProductLocks;

/// What the operator chose to do about an expiring batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationAction {
    /// Withdraw units from stock.
    Pull,
    /// Dismiss the alert without touching stock.
    Clear,
}

/// Watches expiration batches and applies operator decisions.
#[derive(Debug, Clone)]
pub struct ExpirationWatch {
    store: Store,
    locks: Arc<ProductLocks>,
}

impl ExpirationWatch {
    pub fn new(store: Store, locks: Arc<ProductLocks>) -> Self {
        ExpirationWatch { store, locks }
    }

    /// Batches expiring within `horizon_days` of today (already-expired
    /// batches included), joined with their product for display.
    pub async fn near_expiration(&self, horizon_days: i64) -> EngineResult<Vec<ExpiringStock>> {
        let cutoff = Utc::now().date_naive() + Duration::days(horizon_days);
        Ok(self.store.batches().near_expiration(cutoff).await?)
    }

    /// Resolves one alert, identified by its natural key.
    ///
    /// For `Pull`, `quantity` defaults to the whole batch and may not exceed
    /// it. Returns the number of units withdrawn (zero for `Clear`).
    pub async fn resolve(
        &self,
        product_id: &str,
        expiration_date: NaiveDate,
        action: ExpirationAction,
        quantity: Option<i64>,
    ) -> EngineResult<i64> {
        let _guard = self.locks.acquire(product_id).await;

        let mut tx = self.store.begin().await?;

        let batch = self
            .store
            .batches()
            .get_tx(&mut tx, product_id, expiration_date)
            .await?
            .ok_or_else(|| EngineError::not_found("Batch", product_id))?;

        let pulled = match action {
            ExpirationAction::Clear => {
                self.store.batches().delete_tx(&mut tx, &batch.id).await?;
                0
            }
            ExpirationAction::Pull => {
                let quantity = quantity.unwrap_or(batch.quantity);
                if quantity <= 0 || quantity > batch.quantity {
                    return Err(EngineError::InvalidQuantity {
                        product_id: product_id.to_string(),
                        quantity,
                    });
                }

                // Batch quantity never exceeds product quantity, so this
                // decrement cannot push stock negative.
                self.store
                    .products()
                    .adjust_stock_tx(&mut tx, product_id, -quantity)
                    .await?;
                self.store
                    .batches()
                    .reduce_tx(&mut tx, &batch.id, quantity)
                    .await?;

                let movement = StockMovement {
                    id: Uuid::new_v4().to_string(),
                    product_id: product_id.to_string(),
                    delta: -quantity,
                    reason: MovementReason::ExpirationPull,
                    note: Some(format!("expired {expiration_date}")),
                    reference_sale_id: None,
                    created_at: Utc::now(),
                };
                self.store
                    .products()
                    .record_movement_tx(&mut tx, &movement)
                    .await?;

                quantity
            }
        };

        tx.commit().await.map_err(benta_store::StoreError::from)?;

        info!(product_id = %product_id, %expiration_date, pulled, "Expiration alert resolved");
        Ok(pulled)
    }
}
