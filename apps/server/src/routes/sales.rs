//! # Sale Routes
//!
//! Sale commit, cancellation, credit settlement, and analytics.
//!
//! The commit request carries names, prices, and a total for display
//! parity with the client, but the server trusts none of them: only the
//! product ids and quantities reach the engine, which recomputes everything
//! from current catalog state.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;

use benta_core::{PaymentMethod, Sale};
use benta_engine::{CartItem, SaleWithLines, SummaryPeriod};
use benta_store::Bestseller;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list).post(create))
        .route("/sales/details", get(details))
        .route("/sales/bestsellers", get(bestsellers))
        .route("/sales/analytics/summary", get(summary))
        .route("/sales/{id}", get(get_one))
        .route("/sales/{id}/cancel", post(cancel))
        .route("/sales/{id}/mark-paid", put(mark_paid))
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SaleItemRequest {
    /// Product id.
    pub id: String,
    pub quantity: i64,
    // Display fields sent by the client; ignored by the engine.
    #[serde(default)]
    #[allow(dead_code)]
    pub name: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    pub price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub items: Vec<SaleItemRequest>,
    #[serde(alias = "paymentMethod")]
    pub payment_method: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Client-side total; ignored, the server recomputes.
    #[serde(default)]
    #[allow(dead_code)]
    pub total: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct BestsellersQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub period: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateSaleRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let method = PaymentMethod::from_str(&request.payment_method)
        .map_err(|e| ApiError::bad_request(e))?;

    let items: Vec<CartItem> = request
        .items
        .into_iter()
        .map(|item| CartItem {
            product_id: item.id,
            quantity: item.quantity,
        })
        .collect();

    let sale = state
        .engine
        .sales
        .commit_sale(&items, method, request.customer_name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "saleId": sale.id,
            "total": sale.total().to_decimal(),
            "status": sale.status,
        })),
    ))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Sale>>> {
    Ok(Json(state.engine.sales.list_sales().await?))
}

async fn details(State(state): State<AppState>) -> ApiResult<Json<Vec<SaleWithLines>>> {
    Ok(Json(state.engine.sales.sales_with_details().await?))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleWithLines>> {
    Ok(Json(state.engine.sales.get_sale(&id).await?))
}

async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let refund = state.engine.sales.cancel_sale(&id, &request.reason).await?;
    Ok(Json(json!({
        "success": true,
        "refundAmount": refund.to_decimal(),
    })))
}

async fn mark_paid(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let sale = state.engine.sales.mark_paid(&id).await?;
    Ok(Json(json!({ "success": true, "sale": sale })))
}

async fn bestsellers(
    State(state): State<AppState>,
    Query(query): Query<BestsellersQuery>,
) -> ApiResult<Json<Vec<Bestseller>>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    Ok(Json(state.engine.sales.bestsellers(limit).await?))
}

async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let period = query.period.as_deref().unwrap_or("today");
    let period = SummaryPeriod::from_str(period).map_err(ApiError::bad_request)?;

    let summary = state.engine.sales.summary(period).await?;
    Ok(Json(json!({
        "revenue": benta_core::Money::from_centavos(summary.revenue_cents).to_decimal(),
        "saleCount": summary.sale_count,
        "itemsSold": summary.items_sold,
    })))
}
