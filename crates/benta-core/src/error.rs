//! # Error Types
//!
//! Input validation errors shared by every layer above benta-core.
//!
//! ## Error Hierarchy
//! ```text
//! benta-core errors (this file) → ValidationError
//!
//! benta-store errors  → StoreError (separate crate)
//! benta-engine errors → EngineError (separate crate, wraps ValidationError)
//! API errors          → ApiError (what HTTP clients see)
//! ```
//!
//! ## Design Principles
//! 1. `thiserror` for derive macros, never manual impls
//! 2. Include context in messages (field name, bounds)
//! 3. Each variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Detected before any mutation; a failing field blocks the whole operation.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (bad barcode characters, unparseable date, ...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g. duplicate barcode).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::TooShort {
            field: "barcode".to_string(),
            min: 3,
        };
        assert_eq!(err.to_string(), "barcode must be at least 3 characters");
    }
}
