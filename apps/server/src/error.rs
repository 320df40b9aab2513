//! # API Error Mapping
//!
//! Translates engine errors into HTTP responses with stable machine-readable
//! codes. Clients match on `code`, humans read `message`.
//!
//! ## Status Mapping
//! ```text
//! EmptyCart / InvalidQuantity / Validation / Import  → 400
//! NotFound                                           → 404
//! AlreadyCancelled / InvalidStatus                   → 409
//! InsufficientStock                                  → 422
//! Store                                              → 500
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use benta_engine::{EngineError, RowError};

/// An error as the HTTP client sees it.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    /// Per-row detail, only for rejected imports.
    pub rows: Option<Vec<RowError>>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
            rows: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::EmptyCart => {
                ApiError::new(StatusCode::BAD_REQUEST, "empty_cart", message)
            }
            EngineError::InvalidQuantity { .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_quantity", message)
            }
            EngineError::Validation(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "validation_failed", message)
            }
            EngineError::Import(rows) => ApiError {
                status: StatusCode::BAD_REQUEST,
                code: "import_rejected",
                message,
                rows: Some(rows),
            },
            EngineError::NotFound { .. } => {
                ApiError::new(StatusCode::NOT_FOUND, "not_found", message)
            }
            EngineError::AlreadyCancelled { .. } => {
                ApiError::new(StatusCode::CONFLICT, "already_cancelled", message)
            }
            EngineError::InvalidStatus { .. } => {
                ApiError::new(StatusCode::CONFLICT, "invalid_status", message)
            }
            EngineError::InsufficientStock { .. } => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_stock", message)
            }
            EngineError::Store(e) => {
                // Log the real cause, hide it from the client
                error!(error = %e, "Store failure");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "code": self.code,
            "message": self.message,
        });
        if let Some(rows) = self.rows {
            body["errors"] = serde_json::to_value(rows).unwrap_or_default();
        }
        (self.status, Json(body)).into_response()
    }
}

/// Result type for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use benta_store::StoreError;

    fn status_of(err: EngineError) -> StatusCode {
        ApiError::from(err).status
    }

    #[test]
    fn engine_errors_map_to_expected_statuses() {
        assert_eq!(status_of(EngineError::EmptyCart), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(EngineError::InvalidQuantity {
                product_id: "p".into(),
                quantity: 0
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(EngineError::not_found("Product", "p")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(EngineError::AlreadyCancelled { id: "s".into() }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(EngineError::InvalidStatus {
                id: "s".into(),
                expected: "unpaid"
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(EngineError::InsufficientStock {
                product_id: "p".into(),
                name: "Milk".into(),
                available: 1,
                requested: 2
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(EngineError::Store(StoreError::PoolExhausted)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_never_leak_detail() {
        let api: ApiError = EngineError::Store(StoreError::QueryFailed(
            "UNIQUE constraint failed: secret.column".into(),
        ))
        .into();
        assert_eq!(api.message, "An internal error occurred");
    }
}
