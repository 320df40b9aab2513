//! # Domain Types
//!
//! Core domain types used throughout Benta POS.
//!
//! ## Type Overview
//! ```text
//! ┌────────────────┐  ┌────────────────┐  ┌─────────────────────┐
//! │    Product     │  │      Sale      │  │  CashTransaction    │
//! │ ────────────── │  │ ────────────── │  │ ─────────────────── │
//! │ id (UUID)      │  │ id (UUID)      │  │ channel             │
//! │ price_cents    │  │ status         │  │ direction (add/rem) │
//! │ quantity       │  │ total_cents    │  │ amount_cents        │
//! │ min_stock      │  │ lines          │  │ reference_sale_id   │
//! └───────┬────────┘  └────────────────┘  └─────────────────────┘
//!         │
//! ┌───────▼────────┐
//! │ExpirationBatch │  quantity of a product tagged with a date;
//! │ product_id     │  SUM(batch.quantity) <= product.quantity
//! │ expiration_date│
//! └────────────────┘
//! ```
//!
//! `quantity` on the product is the authoritative stock total; batches are a
//! partial breakdown of it for expiration tracking.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown at the counter.
    pub name: String,

    /// Price in centavos.
    pub price_cents: i64,

    /// Current stock level. Never negative.
    pub quantity: i64,

    /// Low-stock threshold (default 5).
    pub min_stock: i64,

    /// Optional unique barcode (>= 3 chars, `[0-9A-Za-z\-_]+`).
    pub barcode: Option<String>,

    pub category: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,

    /// Soft delete flag; historical sales keep referencing the row.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_centavos(self.price_cents)
    }

    /// Low stock: some stock left but at or under the threshold.
    ///
    /// Computed on read, never stored, so it cannot go stale.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity > 0 && self.quantity <= self.min_stock
    }

    #[inline]
    pub fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }
}

// =============================================================================
// Expiration Batch
// =============================================================================

/// A quantity of a product tagged with an expiration date.
///
/// Disappears when its quantity reaches zero or the alert is explicitly
/// cleared ("no action needed").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpirationBatch {
    pub id: String,
    pub product_id: String,
    pub expiration_date: NaiveDate,
    pub quantity: i64,
}

/// A near-expiration alert: batch joined with its product for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringStock {
    pub product_id: String,
    pub product_name: String,
    pub product_quantity: i64,
    pub expiration_date: NaiveDate,
    pub quantity: i64,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// Transitions: `unpaid → completed` (mark-paid) and
/// `{completed, unpaid} → cancelled` (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Stock and cash effects applied, payment settled.
    Completed,
    /// Credit sale: stock decremented, no cash channel touched yet.
    Unpaid,
    /// Reversed. Lines are immutable history, never deleted.
    Cancelled,
}

impl SaleStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Unpaid => "unpaid",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(SaleStatus::Completed),
            "unpaid" => Ok(SaleStatus::Unpaid),
            "cancelled" => Ok(SaleStatus::Cancelled),
            other => Err(format!("unknown sale status: {other}")),
        }
    }
}

// =============================================================================
// Payment Method & Cash Channels
// =============================================================================

/// How the customer pays.
///
/// Cash-like methods credit the matching cash channel at commit time.
/// `Credit` is deferred payment: the sale starts `unpaid` and no channel is
/// touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Credit,
    Gcash,
    Paymaya,
}

impl PaymentMethod {
    /// The cash channel this method settles into, if any.
    pub const fn channel(&self) -> Option<CashChannel> {
        match self {
            PaymentMethod::Cash => Some(CashChannel::Cash),
            PaymentMethod::Gcash => Some(CashChannel::Gcash),
            PaymentMethod::Paymaya => Some(CashChannel::Paymaya),
            PaymentMethod::Credit => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Gcash => "gcash",
            PaymentMethod::Paymaya => "paymaya",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "credit" => Ok(PaymentMethod::Credit),
            "gcash" => Ok(PaymentMethod::Gcash),
            "paymaya" => Ok(PaymentMethod::Paymaya),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// One of the three independent payment-balance buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashChannel {
    Cash,
    Gcash,
    Paymaya,
}

impl CashChannel {
    pub const ALL: [CashChannel; 3] = [CashChannel::Cash, CashChannel::Gcash, CashChannel::Paymaya];

    pub const fn as_str(&self) -> &'static str {
        match self {
            CashChannel::Cash => "cash",
            CashChannel::Gcash => "gcash",
            CashChannel::Paymaya => "paymaya",
        }
    }
}

impl fmt::Display for CashChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CashChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(CashChannel::Cash),
            "gcash" => Ok(CashChannel::Gcash),
            "paymaya" => Ok(CashChannel::Paymaya),
            other => Err(format!("unknown cash channel: {other}")),
        }
    }
}

/// Direction of a cash channel transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashDirection {
    Add,
    Remove,
}

impl CashDirection {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CashDirection::Add => "add",
            CashDirection::Remove => "remove",
        }
    }

    /// Applies the direction's sign to a positive amount.
    pub const fn signed(&self, amount_cents: i64) -> i64 {
        match self {
            CashDirection::Add => amount_cents,
            CashDirection::Remove => -amount_cents,
        }
    }
}

impl FromStr for CashDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(CashDirection::Add),
            "remove" => Ok(CashDirection::Remove),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Created atomically with its stock and cash effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    /// Recomputed server-side from current prices; never taken from clients.
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Required iff the sale is cancelled.
    pub cancellation_reason: Option<String>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_centavos(self.total_cents)
    }
}

/// A line item in a sale.
///
/// Snapshot pattern: name and unit price are frozen at commit time so the
/// record survives later product edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub name_snapshot: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub line_total_cents: i64,
}

// =============================================================================
// Stock Movements
// =============================================================================

/// Why a stock movement happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovementReason {
    Sale,
    Restock,
    ExpirationPull,
    Cancellation,
    Adjustment,
}

impl MovementReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementReason::Sale => "sale",
            MovementReason::Restock => "restock",
            MovementReason::ExpirationPull => "expiration-pull",
            MovementReason::Cancellation => "cancellation",
            MovementReason::Adjustment => "adjustment",
        }
    }
}

impl FromStr for MovementReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(MovementReason::Sale),
            "restock" => Ok(MovementReason::Restock),
            "expiration-pull" => Ok(MovementReason::ExpirationPull),
            "cancellation" => Ok(MovementReason::Cancellation),
            "adjustment" => Ok(MovementReason::Adjustment),
            other => Err(format!("unknown movement reason: {other}")),
        }
    }
}

/// Audit trail entry: one row per stock mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub delta: i64,
    pub reason: MovementReason,
    pub note: Option<String>,
    pub reference_sale_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cash Channel State
// =============================================================================

/// The three channel balances, in centavos.
///
/// Invariant: each balance equals the signed sum of its transaction log.
/// Balances may go negative through explicit manual removal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CashBalances {
    pub cash_cents: i64,
    pub gcash_cents: i64,
    pub paymaya_cents: i64,
}

impl CashBalances {
    pub const fn get(&self, channel: CashChannel) -> i64 {
        match channel {
            CashChannel::Cash => self.cash_cents,
            CashChannel::Gcash => self.gcash_cents,
            CashChannel::Paymaya => self.paymaya_cents,
        }
    }
}

/// An append-only cash channel log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashTransaction {
    pub id: String,
    pub channel: CashChannel,
    pub direction: CashDirection,
    pub amount_cents: i64,
    pub reason: String,
    pub reference_sale_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(quantity: i64, min_stock: i64) -> Product {
        Product {
            id: "p-1".to_string(),
            name: "Test".to_string(),
            price_cents: 2000,
            quantity,
            min_stock,
            barcode: None,
            category: None,
            brand: None,
            description: None,
            image_url: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn low_stock_is_computed_not_stored() {
        assert!(product(5, 5).is_low_stock());
        assert!(product(1, 5).is_low_stock());
        assert!(!product(6, 5).is_low_stock());
        // Out of stock is its own state, not low stock
        assert!(!product(0, 5).is_low_stock());
        assert!(product(0, 5).is_out_of_stock());
    }

    #[test]
    fn payment_method_channel_mapping() {
        assert_eq!(PaymentMethod::Cash.channel(), Some(CashChannel::Cash));
        assert_eq!(PaymentMethod::Gcash.channel(), Some(CashChannel::Gcash));
        assert_eq!(PaymentMethod::Paymaya.channel(), Some(CashChannel::Paymaya));
        assert_eq!(PaymentMethod::Credit.channel(), None);
    }

    #[test]
    fn enums_roundtrip_through_strings() {
        for status in [SaleStatus::Completed, SaleStatus::Unpaid, SaleStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<SaleStatus>().unwrap(), status);
        }
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::Credit,
            PaymentMethod::Gcash,
            PaymentMethod::Paymaya,
        ] {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
        }
        assert!("venmo".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn direction_sign() {
        assert_eq!(CashDirection::Add.signed(500), 500);
        assert_eq!(CashDirection::Remove.signed(500), -500);
    }
}
