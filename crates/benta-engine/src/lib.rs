//! # benta-engine: Transaction Settlement Engine for Benta POS
//!
//! Coordinates the atomic operations of the point of sale: sale commits
//! (stock decrement + sale record + cash channel credit in one transaction),
//! cancellations with stock restore and refund, credit settlement,
//! expiration-driven withdrawals, and all-or-nothing bulk imports.
//!
//! ## Module Organization
//!
//! - [`sale`] - Sale commit, cancel, mark-paid, analytics
//! - [`stock`] - Product lifecycle and restock
//! - [`cash`] - Cash channel reads and manual adjustments
//! - [`expiration`] - Near-expiration alerts and resolution
//! - [`import`] - All-or-nothing bulk product import
//! - [`locks`] - Per-product lock manager
//! - [`error`] - Engine error types
//!
//! ## Concurrency Model
//!
//! Stock-decrementing paths (sale commit, expiration pull) hold the
//! per-product lock across their check-then-decrement window. Increments
//! are pure SQL deltas and need no lock. WAL mode keeps readers off the
//! writer entirely.

pub mod cash;
pub mod error;
pub mod expiration;
pub mod import;
pub mod locks;
pub mod sale;
pub mod stock;

use std::sync::Arc;

use benta_store::Store;

pub use cash::{CashAmounts, CashLedger};
pub use error::{EngineError, EngineResult, RowError};
pub use expiration::{ExpirationAction, ExpirationWatch};
pub use import::{BulkImporter, RawProductRecord};
pub use locks::ProductLocks;
pub use sale::{CartItem, SaleEngine, SaleWithLines, SummaryPeriod};
pub use stock::{ProductDraft, StockReconciler};

/// All engine components wired to one store, sharing one lock manager.
#[derive(Debug, Clone)]
pub struct Engine {
    pub stock: StockReconciler,
    pub sales: SaleEngine,
    pub cash: CashLedger,
    pub expiration: ExpirationWatch,
    pub import: BulkImporter,
}

impl Engine {
    pub fn new(store: Store) -> Self {
        let locks = Arc::new(ProductLocks::new());
        Engine {
            stock: StockReconciler::new(store.clone(), locks.clone()),
            sales: SaleEngine::new(store.clone(), locks.clone()),
            cash: CashLedger::new(store.clone()),
            expiration: ExpirationWatch::new(store.clone(), locks),
            import: BulkImporter::new(store),
        }
    }
}
