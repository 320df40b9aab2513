//! # Engine Error Types
//!
//! Domain errors raised by the settlement engine. The API layer maps these
//! onto HTTP status codes; nothing here knows about HTTP.

use thiserror::Error;

use benta_core::ValidationError;
use benta_store::StoreError;

/// One rejected row in a bulk import.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RowError {
    /// 1-based row number as the operator sees it in the file.
    pub row: usize,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}: {}", self.row, self.field, self.message)
    }
}

/// Settlement engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A sale was submitted with no line items.
    #[error("Cannot commit a sale with an empty cart")]
    EmptyCart,

    /// A line quantity was zero, negative, or over the per-line limit.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: i64 },

    /// Requested more units than are on hand. Nothing was committed.
    #[error("Insufficient stock for '{name}': {available} available, {requested} requested")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Referenced entity does not exist (or is inactive).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The sale is already cancelled; cancellation is terminal.
    #[error("Sale {id} is already cancelled")]
    AlreadyCancelled { id: String },

    /// The sale is not in the status the operation requires.
    #[error("Sale {id} is not {expected}")]
    InvalidStatus { id: String, expected: &'static str },

    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Bulk import rejected; no rows were written.
    #[error("Import rejected: {} invalid row(s)", .0.len())]
    Import(Vec<RowError>),

    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_operator_readable() {
        let err = EngineError::InsufficientStock {
            product_id: "p-1".to_string(),
            name: "Milk".to_string(),
            available: 2,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 'Milk': 2 available, 5 requested"
        );

        let err = EngineError::Import(vec![RowError {
            row: 3,
            field: "price".to_string(),
            message: "not a number".to_string(),
        }]);
        assert_eq!(err.to_string(), "Import rejected: 1 invalid row(s)");
    }
}
