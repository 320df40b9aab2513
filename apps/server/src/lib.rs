//! # benta-server: REST API for Benta POS
//!
//! Thin HTTP layer over the settlement engine. Handlers deserialize,
//! delegate, and serialize; every business rule lives in `benta-engine`.
//!
//! ## Surface
//! ```text
//! /health                              liveness + database check
//! /products/...                        catalog, restock, expiration, import
//! /sales/...                           commit, cancel, settle, analytics
//! /cash/...                            channel balances and adjustments
//! ```

pub mod config;
pub mod error;
pub mod routes;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use benta_engine::Engine;
use benta_store::{Store, StoreConfig};

use config::ServerConfig;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
    pub store: Store,
    /// Alert window for `GET /products/near-expiration`.
    pub expiry_horizon_days: i64,
}

impl AppState {
    /// Opens the store at the configured path and wires the engine.
    pub async fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let store = Store::new(StoreConfig::new(&config.db_path)).await?;
        Ok(AppState {
            engine: Engine::new(store.clone()),
            store,
            expiry_horizon_days: config.expiry_horizon_days,
        })
    }

    /// In-memory state for tests.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let store = Store::new(StoreConfig::in_memory()).await?;
        Ok(AppState {
            engine: Engine::new(store.clone()),
            store,
            expiry_horizon_days: 7,
        })
    }
}

/// Builds the full application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::products::router())
        .merge(routes::sales::router())
        .merge(routes::cash::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "database": state.store.health_check().await,
    }))
}
