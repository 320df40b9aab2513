//! # Product Routes
//!
//! Catalog CRUD, barcode lookup, restock, expiration alerts, and bulk import.
//!
//! Prices cross this boundary as decimal pesos and are converted to integer
//! centavos immediately; nothing past the request structs sees a decimal.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use benta_core::{Money, Product, DEFAULT_MIN_STOCK};
use benta_engine::{EngineError, ExpirationAction, ProductDraft, RawProductRecord};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/low-stock", get(low_stock))
        .route("/products/near-expiration", get(near_expiration))
        .route("/products/expiration-notification", post(expiration_notification))
        .route("/products/import-csv", post(import_csv))
        .route("/products/barcode/{code}", get(by_barcode))
        .route("/products/{id}", get(get_one).put(update).delete(delete_one))
        .route("/products/{id}/restock", post(restock))
        .route("/products/{id}/movements", get(movements))
}

// =============================================================================
// Views and Payloads
// =============================================================================

/// Product as the client sees it: decimal pesos, computed stock flags.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: i64,
    pub min_stock: i64,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_low_stock: bool,
    pub is_out_of_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductView {
    fn from(p: Product) -> Self {
        ProductView {
            price: p.price().to_decimal(),
            is_low_stock: p.is_low_stock(),
            is_out_of_stock: p.is_out_of_stock(),
            id: p.id,
            name: p.name,
            quantity: p.quantity,
            min_stock: p.min_stock,
            barcode: p.barcode,
            category: p.category,
            brand: p.brand,
            description: p.description,
            image_url: p.image_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default, alias = "minStock")]
    pub min_stock: Option<i64>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Initial stock expiration; only honored on create.
    #[serde(default, alias = "expirationDate")]
    pub expiration_date: Option<NaiveDate>,
}

impl ProductPayload {
    fn into_draft(self) -> ApiResult<ProductDraft> {
        let price = Money::from_decimal(self.price).map_err(EngineError::Validation)?;
        Ok(ProductDraft {
            name: self.name,
            price,
            quantity: self.quantity.unwrap_or(0),
            min_stock: self.min_stock.unwrap_or(DEFAULT_MIN_STOCK),
            barcode: self.barcode.filter(|b| !b.trim().is_empty()),
            category: self.category,
            brand: self.brand,
            description: self.description,
            image_url: self.image_url,
            expiration_date: self.expiration_date,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub quantity: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "expirationDate")]
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ExpirationNotificationRequest {
    #[serde(alias = "productId")]
    pub product_id: String,
    #[serde(alias = "expirationDate")]
    pub expiration_date: NaiveDate,
    pub action: String,
    #[serde(default, alias = "quantityToPull")]
    pub quantity_to_pull: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub products: Vec<RawProductRecord>,
}

#[derive(Debug, Deserialize)]
pub struct HorizonQuery {
    #[serde(default)]
    pub days: Option<i64>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductView>>> {
    let products = state.engine.stock.list_products().await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

async fn create(
    State(state): State<AppState>,
    Json(payload): Json<ProductPayload>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let product = state.engine.stock.create_product(payload.into_draft()?).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": product.id, "barcode": product.barcode })),
    ))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductView>> {
    Ok(Json(state.engine.stock.get_product(&id).await?.into()))
}

async fn by_barcode(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<ProductView>> {
    Ok(Json(state.engine.stock.get_by_barcode(&code).await?.into()))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductPayload>,
) -> ApiResult<Json<ProductView>> {
    let updated = state
        .engine
        .stock
        .update_product(&id, payload.into_draft()?)
        .await?;
    Ok(Json(updated.into()))
}

async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.engine.stock.delete_product(&id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn low_stock(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductView>>> {
    let products = state.engine.stock.low_stock().await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

async fn movements(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<benta_core::StockMovement>>> {
    Ok(Json(state.engine.stock.movements(&id).await?))
}

async fn restock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RestockRequest>,
) -> ApiResult<Json<ProductView>> {
    let product = state
        .engine
        .stock
        .restock(
            &id,
            request.quantity,
            request.notes.as_deref(),
            request.expiration_date,
        )
        .await?;
    Ok(Json(product.into()))
}

async fn near_expiration(
    State(state): State<AppState>,
    Query(query): Query<HorizonQuery>,
) -> ApiResult<Json<Vec<benta_core::ExpiringStock>>> {
    let horizon = query.days.unwrap_or(state.expiry_horizon_days);
    Ok(Json(state.engine.expiration.near_expiration(horizon).await?))
}

async fn expiration_notification(
    State(state): State<AppState>,
    Json(request): Json<ExpirationNotificationRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let action = match request.action.as_str() {
        "pull" | "remove" => ExpirationAction::Pull,
        "clear" | "dismiss" => ExpirationAction::Clear,
        other => {
            return Err(ApiError::bad_request(format!(
                "unknown action '{other}', expected 'pull' or 'clear'"
            )))
        }
    };

    let pulled = state
        .engine
        .expiration
        .resolve(
            &request.product_id,
            request.expiration_date,
            action,
            request.quantity_to_pull,
        )
        .await?;

    Ok(Json(json!({ "success": true, "quantityPulled": pulled })))
}

async fn import_csv(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let products = state.engine.import.import(&request.products).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "imported": products.len() })),
    ))
}
