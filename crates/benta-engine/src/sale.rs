//! # Sale Engine
//!
//! The settlement core: committing, cancelling, and settling sales.
//!
//! ## Commit Flow
//! ```text
//! cart ──► validate ──► lock products (ascending id)
//!                              │
//!                              ▼
//!                        BEGIN TRANSACTION
//!                          check + decrement stock per line
//!                          trim expiration batches (FEFO)
//!                          insert sale + line snapshots
//!                          credit cash channel (non-credit sales)
//!                        COMMIT
//! ```
//!
//! Any line failing its stock check aborts the whole transaction; a sale is
//! all-or-nothing. Totals are recomputed from current product prices, never
//! taken from the client.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use benta_core::{
    validation, Money, MovementReason, PaymentMethod, Sale, SaleLine, SaleStatus, StockMovement,
    MAX_CART_LINES,
};
use benta_store::{Bestseller, SalesSummary, Store};

use crate::error::{EngineError, EngineResult};
use crate::locks::ProductLocks;

// =============================================================================
// Inputs and Views
// =============================================================================

/// One requested cart line. Only the product id and quantity are trusted;
/// names and prices come from the store at commit time.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i64,
}

/// A committed sale together with its line snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct SaleWithLines {
    #[serde(flatten)]
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

/// Analytics window for the sales summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryPeriod {
    Today,
    Week,
    Month,
    All,
}

impl SummaryPeriod {
    /// Start of the window, in UTC.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            SummaryPeriod::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .unwrap_or_default()
                .and_utc(),
            SummaryPeriod::Week => now - Duration::days(7),
            SummaryPeriod::Month => now - Duration::days(30),
            SummaryPeriod::All => DateTime::<Utc>::MIN_UTC,
        }
    }
}

impl FromStr for SummaryPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(SummaryPeriod::Today),
            "week" => Ok(SummaryPeriod::Week),
            "month" => Ok(SummaryPeriod::Month),
            "all" => Ok(SummaryPeriod::All),
            other => Err(format!("unknown period: {other}")),
        }
    }
}

// =============================================================================
// Sale Engine
// =============================================================================

/// Commits and settles sales atomically against stock and cash channels.
#[derive(Debug, Clone)]
pub struct SaleEngine {
    store: Store,
    locks: Arc<ProductLocks>,
}

impl SaleEngine {
    pub fn new(store: Store, locks: Arc<ProductLocks>) -> Self {
        SaleEngine { store, locks }
    }

    /// Commits a sale: decrements stock, records the sale with line
    /// snapshots, and credits the payment channel, all in one transaction.
    ///
    /// Credit sales start `unpaid` and touch no channel. Duplicate product
    /// ids in the cart are merged before the stock check so the check sees
    /// the true total demand.
    pub async fn commit_sale(
        &self,
        items: &[CartItem],
        payment_method: PaymentMethod,
        customer_name: Option<String>,
    ) -> EngineResult<Sale> {
        if items.is_empty() {
            return Err(EngineError::EmptyCart);
        }
        if items.len() > MAX_CART_LINES {
            return Err(benta_core::ValidationError::OutOfRange {
                field: "items".to_string(),
                min: 1,
                max: MAX_CART_LINES as i64,
            }
            .into());
        }

        // Merge duplicate lines; BTreeMap also gives the deterministic
        // ascending order the lock manager relies on.
        let mut demand: BTreeMap<String, i64> = BTreeMap::new();
        for item in items {
            *demand.entry(item.product_id.clone()).or_insert(0) += item.quantity;
        }
        for (product_id, &quantity) in &demand {
            validation::validate_line_quantity(quantity).map_err(|_| {
                EngineError::InvalidQuantity {
                    product_id: product_id.clone(),
                    quantity,
                }
            })?;
        }

        let ids: Vec<String> = demand.keys().cloned().collect();
        let _guards = self.locks.acquire_many(&ids).await;

        let now = Utc::now();
        let sale_id = Uuid::new_v4().to_string();

        let mut tx = self.store.begin().await?;

        let mut lines = Vec::with_capacity(demand.len());
        let mut total = Money::zero();

        for (product_id, &quantity) in &demand {
            let product = self
                .store
                .products()
                .get_tx(&mut tx, product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| EngineError::not_found("Product", product_id.clone()))?;

            if product.quantity < quantity {
                return Err(EngineError::InsufficientStock {
                    product_id: product.id,
                    name: product.name,
                    available: product.quantity,
                    requested: quantity,
                });
            }

            self.store
                .products()
                .adjust_stock_tx(&mut tx, product_id, -quantity)
                .await?;
            self.store
                .batches()
                .trim_to_total_tx(&mut tx, product_id, product.quantity - quantity)
                .await?;

            let movement = StockMovement {
                id: Uuid::new_v4().to_string(),
                product_id: product_id.clone(),
                delta: -quantity,
                reason: MovementReason::Sale,
                note: None,
                reference_sale_id: Some(sale_id.clone()),
                created_at: now,
            };
            self.store
                .products()
                .record_movement_tx(&mut tx, &movement)
                .await?;

            let line_total = product.price().multiply_quantity(quantity);
            total += line_total;

            lines.push(SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: product_id.clone(),
                name_snapshot: product.name,
                unit_price_cents: product.price_cents,
                quantity,
                line_total_cents: line_total.centavos(),
            });
        }

        let status = match payment_method {
            PaymentMethod::Credit => SaleStatus::Unpaid,
            _ => SaleStatus::Completed,
        };

        let sale = Sale {
            id: sale_id.clone(),
            total_cents: total.centavos(),
            payment_method,
            customer_name,
            status,
            created_at: now,
            paid_at: (status == SaleStatus::Completed).then_some(now),
            cancelled_at: None,
            cancellation_reason: None,
        };

        self.store.sales().insert_sale_tx(&mut tx, &sale).await?;
        for line in &lines {
            self.store.sales().insert_line_tx(&mut tx, line).await?;
        }

        if let Some(channel) = payment_method.channel() {
            if total.is_positive() {
                self.store
                    .cash()
                    .apply_tx(
                        &mut tx,
                        channel,
                        benta_core::CashDirection::Add,
                        total.centavos(),
                        "sale",
                        Some(&sale_id),
                        now,
                    )
                    .await?;
            }
        }

        tx.commit().await.map_err(benta_store::StoreError::from)?;

        info!(
            id = %sale.id,
            total = %sale.total(),
            method = payment_method.as_str(),
            lines = lines.len(),
            "Sale committed"
        );

        Ok(sale)
    }

    /// Marks an unpaid credit sale as paid.
    ///
    /// Settlement only flips the status and stamps `paid_at`; no cash
    /// channel is credited. Credit collections are reconciled through the
    /// manual cash adjustment workflow.
    pub async fn mark_paid(&self, sale_id: &str) -> EngineResult<Sale> {
        let mut tx = self.store.begin().await?;

        let affected = self
            .store
            .sales()
            .mark_paid_tx(&mut tx, sale_id, Utc::now())
            .await?;

        if affected == 0 {
            // Distinguish missing, cancelled, and already-completed sales
            let sale = self
                .store
                .sales()
                .get_tx(&mut tx, sale_id)
                .await?
                .ok_or_else(|| EngineError::not_found("Sale", sale_id))?;

            return Err(match sale.status {
                SaleStatus::Cancelled => EngineError::AlreadyCancelled {
                    id: sale_id.to_string(),
                },
                _ => EngineError::InvalidStatus {
                    id: sale_id.to_string(),
                    expected: "unpaid",
                },
            });
        }

        let sale = self
            .store
            .sales()
            .get_tx(&mut tx, sale_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Sale", sale_id))?;

        tx.commit().await.map_err(benta_store::StoreError::from)?;

        info!(id = %sale_id, "Sale marked paid");
        Ok(sale)
    }

    /// Cancels a sale and restores stock for every line. Returns the refund
    /// amount the operator owes the customer (zero for credit sales, which
    /// never collected anything at commit).
    ///
    /// The cash channel is deliberately NOT reversed here: the drawer or
    /// wallet is adjusted manually through the cash update workflow, with
    /// the returned amount as the figure to post.
    ///
    /// Idempotency: the status flip is a guarded UPDATE, so of two racing
    /// cancellations exactly one restores stock.
    pub async fn cancel_sale(&self, sale_id: &str, reason: &str) -> EngineResult<Money> {
        validation::validate_reason(reason)?;

        // Quantity edits hold the product lock and write absolute values;
        // the restore must serialize against them. Lines are immutable, so
        // reading them ahead of the lock is safe.
        let line_products: Vec<String> = self
            .store
            .sales()
            .lines(sale_id)
            .await?
            .into_iter()
            .map(|line| line.product_id)
            .collect();
        let _guards = self.locks.acquire_many(&line_products).await;

        let mut tx = self.store.begin().await?;

        let sale = self
            .store
            .sales()
            .get_tx(&mut tx, sale_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Sale", sale_id))?;

        if sale.status == SaleStatus::Cancelled {
            return Err(EngineError::AlreadyCancelled {
                id: sale_id.to_string(),
            });
        }

        let now = Utc::now();
        let affected = self
            .store
            .sales()
            .cancel_tx(&mut tx, sale_id, reason.trim(), now)
            .await?;
        if affected == 0 {
            // Lost the race to another cancellation
            warn!(id = %sale_id, "Cancel raced with another cancel");
            return Err(EngineError::AlreadyCancelled {
                id: sale_id.to_string(),
            });
        }

        for line in self.store.sales().lines_tx(&mut tx, sale_id).await? {
            self.store
                .products()
                .adjust_stock_tx(&mut tx, &line.product_id, line.quantity)
                .await?;

            let movement = StockMovement {
                id: Uuid::new_v4().to_string(),
                product_id: line.product_id.clone(),
                delta: line.quantity,
                reason: MovementReason::Cancellation,
                note: Some(reason.trim().to_string()),
                reference_sale_id: Some(sale_id.to_string()),
                created_at: now,
            };
            self.store
                .products()
                .record_movement_tx(&mut tx, &movement)
                .await?;
        }

        // Only cash-like methods collected money at commit time; credit
        // sales (even ones later marked paid) have nothing to hand back.
        let refund = match sale.payment_method.channel() {
            Some(_) => sale.total(),
            None => Money::zero(),
        };

        tx.commit().await.map_err(benta_store::StoreError::from)?;

        info!(id = %sale_id, refund = %refund, "Sale cancelled");
        Ok(refund)
    }

    /// All sales, newest first.
    pub async fn list_sales(&self) -> EngineResult<Vec<Sale>> {
        Ok(self.store.sales().list().await?)
    }

    /// Gets one sale with its lines.
    pub async fn get_sale(&self, sale_id: &str) -> EngineResult<SaleWithLines> {
        let sale = self
            .store
            .sales()
            .get(sale_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Sale", sale_id))?;
        let lines = self.store.sales().lines(sale_id).await?;
        Ok(SaleWithLines { sale, lines })
    }

    /// All sales with their lines, newest first. Lines are fetched in one
    /// query and grouped in memory.
    pub async fn sales_with_details(&self) -> EngineResult<Vec<SaleWithLines>> {
        let sales = self.store.sales().list().await?;
        let mut by_sale: BTreeMap<String, Vec<SaleLine>> = BTreeMap::new();
        for line in self.store.sales().all_lines().await? {
            by_sale.entry(line.sale_id.clone()).or_default().push(line);
        }

        Ok(sales
            .into_iter()
            .map(|sale| {
                let lines = by_sale.remove(&sale.id).unwrap_or_default();
                SaleWithLines { sale, lines }
            })
            .collect())
    }

    /// Top sellers by units sold, cancelled sales excluded.
    pub async fn bestsellers(&self, limit: i64) -> EngineResult<Vec<Bestseller>> {
        Ok(self.store.sales().bestsellers(limit).await?)
    }

    /// Revenue summary over the given window, cancelled sales excluded.
    pub async fn summary(&self, period: SummaryPeriod) -> EngineResult<SalesSummary> {
        Ok(self
            .store
            .sales()
            .summary_since(period.since(Utc::now()))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_period_parses() {
        assert_eq!("today".parse::<SummaryPeriod>().unwrap(), SummaryPeriod::Today);
        assert_eq!("week".parse::<SummaryPeriod>().unwrap(), SummaryPeriod::Week);
        assert_eq!("month".parse::<SummaryPeriod>().unwrap(), SummaryPeriod::Month);
        assert_eq!("all".parse::<SummaryPeriod>().unwrap(), SummaryPeriod::All);
        assert!("quarter".parse::<SummaryPeriod>().is_err());
    }

    #[test]
    fn summary_window_starts() {
        let now = Utc::now();
        assert!(SummaryPeriod::Today.since(now) <= now);
        assert_eq!(SummaryPeriod::Week.since(now), now - Duration::days(7));
        assert!(SummaryPeriod::All.since(now) < SummaryPeriod::Month.since(now));
    }
}
