//! # Cash Routes
//!
//! Channel balance reads and the manual adjustment workflow. An update
//! request carries positive peso amounts per channel plus one direction;
//! each supplied amount becomes its own log entry.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;

use benta_core::{CashBalances, CashDirection, CashTransaction, Money};
use benta_engine::{CashAmounts, EngineError};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cash/balance", get(balance))
        .route("/cash/update", post(update))
        .route("/cash/transactions", get(transactions))
}

#[derive(Debug, Deserialize)]
pub struct CashUpdateRequest {
    #[serde(default, alias = "cashOnHand")]
    pub cash_on_hand: Option<Decimal>,
    #[serde(default, alias = "gcashBalance")]
    pub gcash_balance: Option<Decimal>,
    #[serde(default, alias = "paymayaBalance")]
    pub paymaya_balance: Option<Decimal>,
    /// "add" or "remove"; applies to every supplied amount.
    pub transaction_type: String,
    pub description: String,
    #[serde(default)]
    pub reference_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

fn balance_body(balances: CashBalances) -> serde_json::Value {
    json!({
        "cashOnHand": Money::from_centavos(balances.cash_cents).to_decimal(),
        "gcashBalance": Money::from_centavos(balances.gcash_cents).to_decimal(),
        "paymayaBalance": Money::from_centavos(balances.paymaya_cents).to_decimal(),
    })
}

async fn balance(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    Ok(Json(balance_body(state.engine.cash.balances().await?)))
}

async fn update(
    State(state): State<AppState>,
    Json(request): Json<CashUpdateRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let direction = CashDirection::from_str(&request.transaction_type)
        .map_err(ApiError::bad_request)?;

    let to_cents = |value: Option<Decimal>| -> ApiResult<Option<i64>> {
        value
            .map(|d| Money::from_decimal(d).map(|m| m.centavos()))
            .transpose()
            .map_err(|e| ApiError::from(EngineError::Validation(e)))
    };

    let amounts = CashAmounts {
        cash_cents: to_cents(request.cash_on_hand)?,
        gcash_cents: to_cents(request.gcash_balance)?,
        paymaya_cents: to_cents(request.paymaya_balance)?,
    };

    let balances = state
        .engine
        .cash
        .apply_manual_update(
            amounts,
            direction,
            &request.description,
            request.reference_id.as_deref(),
        )
        .await?;

    let mut body = balance_body(balances);
    body["success"] = json!(true);
    Ok(Json(body))
}

async fn transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> ApiResult<Json<Vec<CashTransaction>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    Ok(Json(state.engine.cash.transactions(limit).await?))
}
