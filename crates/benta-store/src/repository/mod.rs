//! # Repository Module
//!
//! Repository implementations for the ledger store.
//!
//! ## Pattern
//! ```text
//! Engine                    Repository                   SQLite
//! ──────                    ──────────                   ──────
//! commit_sale()  ──────►    adjust_stock_tx(conn, ...)   UPDATE products ...
//!                           insert_sale_tx(conn, ...)    INSERT INTO sales ...
//!                           apply_tx(conn, ...)          UPDATE cash_channels ...
//! ```
//!
//! Read methods execute against the pool; `*_tx` methods take a
//! `&mut SqliteConnection` and participate in the caller's transaction.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - products, stock deltas, movement log
//! - [`batch::BatchRepository`] - expiration batches
//! - [`sale::SaleRepository`] - sales, lines, status transitions, analytics
//! - [`cash::CashRepository`] - channel balances and transaction log

pub mod batch;
pub mod cash;
pub mod product;
pub mod sale;
