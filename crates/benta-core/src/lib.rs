//! # benta-core: Pure Business Logic for Benta POS
//!
//! This crate is the heart of the settlement engine. It contains the domain
//! types and validation rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  apps/server (axum REST)                                            │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  benta-engine (sale commits, stock reconciler, cash ledger)         │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  benta-store (SQLite ledger store)                                  │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ★ benta-core (THIS CRATE) ★                                        │
//! │    types • money • validation • errors                              │
//! │    NO I/O • NO DATABASE • NO NETWORK                                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Integer Money**: every monetary value is centavos (i64); decimals
//!    exist only at the JSON/CSV boundary, floats never.
//! 2. **Explicit Errors**: all errors are typed enum variants, never strings
//!    or panics.
//! 3. **Server-authoritative**: totals and snapshots are recomputed here from
//!    current product state; client-supplied totals are never trusted.

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use error::ValidationError;
pub use money::Money;
pub use types::*;

/// Default low-stock threshold for products that do not specify one.
pub const DEFAULT_MIN_STOCK: i64 = 5;

/// Maximum distinct lines accepted in a single sale.
///
/// Prevents runaway carts; a counter sale at a sari-sari store never comes
/// close to this.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in a sale.
pub const MAX_LINE_QUANTITY: i64 = 999;
