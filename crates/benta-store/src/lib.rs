//! # benta-store: Ledger Store for Benta POS
//!
//! SQLite-backed record store holding product stock, expiration batches,
//! sale records, and cash channel balances. Everything above this crate
//! reads and writes through it.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store error types
//! - [`repository`] - Repository implementations (product, batch, sale, cash)
//!
//! ## Transactions
//!
//! Read methods run against the pool. Mutation methods take
//! `&mut SqliteConnection` so the settlement engine can compose a sale
//! commit (stock decrement + sale insert + channel credit) into a single
//! transaction: readers never observe a partially applied commit.
//!
//! ```rust,ignore
//! let mut tx = store.begin().await?;
//! store.products().adjust_stock_tx(&mut tx, &id, -3).await?;
//! store.sales().insert_sale_tx(&mut tx, &sale).await?;
//! tx.commit().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{StoreError, StoreResult};
pub use pool::{Store, StoreConfig};
pub use repository::batch::BatchRepository;
pub use repository::cash::CashRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{Bestseller, SaleRepository, SalesSummary};
