//! # Stock Reconciler
//!
//! Product lifecycle and stock-affecting operations. Every mutation runs in
//! one transaction and leaves a stock movement behind, so the movement log
//! replays to the current quantity.
//!
//! ## Invariants
//! - `quantity` never goes negative; decrements are checked under the
//!   product lock before they are applied.
//! - `SUM(batches.quantity) <= product.quantity` at every commit point;
//!   decrements trim batches FEFO to restore it.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use benta_core::{
    validation, Money, MovementReason, Product, StockMovement, DEFAULT_MIN_STOCK,
};
use benta_store::Store;

use crate::error::{EngineError, EngineResult};
use crate::locks::ProductLocks;

// =============================================================================
// Product Draft
// =============================================================================

/// Validated input for creating or replacing a product.
///
/// Shared by the single-product path and the bulk importer so both enforce
/// identical rules.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub price: Money,
    pub quantity: i64,
    pub min_stock: i64,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Tags the initial quantity as an expiration batch. Only honored on
    /// create/import; edits never rewrite batches.
    pub expiration_date: Option<NaiveDate>,
}

impl ProductDraft {
    /// Minimal draft with defaults for the optional fields.
    pub fn new(name: impl Into<String>, price: Money, quantity: i64) -> Self {
        ProductDraft {
            name: name.into(),
            price,
            quantity,
            min_stock: DEFAULT_MIN_STOCK,
            barcode: None,
            category: None,
            brand: None,
            description: None,
            image_url: None,
            expiration_date: None,
        }
    }

    /// Runs all field validators. Nothing is written if any fail.
    pub fn validate(&self) -> EngineResult<()> {
        validation::validate_product_name(&self.name)?;
        validation::validate_price(self.price)?;
        validation::validate_stock_quantity(self.quantity)?;
        validation::validate_min_stock(self.min_stock)?;
        if let Some(barcode) = &self.barcode {
            validation::validate_barcode(barcode)?;
        }
        Ok(())
    }
}

// =============================================================================
// Stock Reconciler
// =============================================================================

/// Coordinates product CRUD and stock changes against the store.
#[derive(Debug, Clone)]
pub struct StockReconciler {
    store: Store,
    locks: Arc<ProductLocks>,
}

impl StockReconciler {
    pub fn new(store: Store, locks: Arc<ProductLocks>) -> Self {
        StockReconciler { store, locks }
    }

    /// Lists active products.
    pub async fn list_products(&self) -> EngineResult<Vec<Product>> {
        Ok(self.store.products().list().await?)
    }

    /// Gets one product by id.
    pub async fn get_product(&self, id: &str) -> EngineResult<Product> {
        self.store
            .products()
            .get(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", id))
    }

    /// Looks up an active product by barcode (scanner path).
    pub async fn get_by_barcode(&self, barcode: &str) -> EngineResult<Product> {
        self.store
            .products()
            .get_by_barcode(barcode)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", barcode))
    }

    /// Active products at or under their low-stock threshold.
    pub async fn low_stock(&self) -> EngineResult<Vec<Product>> {
        Ok(self.store.products().low_stock().await?)
    }

    /// Stock movement history for one product, newest first.
    pub async fn movements(&self, product_id: &str) -> EngineResult<Vec<StockMovement>> {
        Ok(self.store.products().movements(product_id).await?)
    }

    /// Creates a product. Barcodes must be unique across all products,
    /// including soft-deleted ones.
    pub async fn create_product(&self, draft: ProductDraft) -> EngineResult<Product> {
        draft.validate()?;

        if let Some(barcode) = &draft.barcode {
            if self.store.products().barcode_exists(barcode).await? {
                return Err(benta_core::ValidationError::Duplicate {
                    field: "barcode".to_string(),
                    value: barcode.clone(),
                }
                .into());
            }
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            price_cents: draft.price.centavos(),
            quantity: draft.quantity,
            min_stock: draft.min_stock,
            barcode: draft.barcode,
            category: draft.category,
            brand: draft.brand,
            description: draft.description,
            image_url: draft.image_url,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.store.begin().await?;
        self.store.products().insert_tx(&mut tx, &product).await?;
        if product.quantity > 0 {
            if let Some(date) = draft.expiration_date {
                self.store
                    .batches()
                    .upsert_add_tx(&mut tx, &product.id, date, product.quantity)
                    .await?;
            }
            let movement = StockMovement {
                id: Uuid::new_v4().to_string(),
                product_id: product.id.clone(),
                delta: product.quantity,
                reason: MovementReason::Adjustment,
                note: Some("initial stock".to_string()),
                reference_sale_id: None,
                created_at: now,
            };
            self.store
                .products()
                .record_movement_tx(&mut tx, &movement)
                .await?;
        }
        tx.commit().await.map_err(benta_store::StoreError::from)?;

        info!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Updates a product's editable fields. Direct quantity edits go through
    /// here and leave an adjustment movement.
    pub async fn update_product(&self, id: &str, draft: ProductDraft) -> EngineResult<Product> {
        draft.validate()?;

        let _guard = self.locks.acquire(id).await;

        let existing = self.get_product(id).await?;

        if let Some(barcode) = &draft.barcode {
            if existing.barcode.as_deref() != Some(barcode.as_str())
                && self.store.products().barcode_exists(barcode).await?
            {
                return Err(benta_core::ValidationError::Duplicate {
                    field: "barcode".to_string(),
                    value: barcode.clone(),
                }
                .into());
            }
        }

        let updated = Product {
            id: existing.id.clone(),
            name: draft.name.trim().to_string(),
            price_cents: draft.price.centavos(),
            quantity: draft.quantity,
            min_stock: draft.min_stock,
            barcode: draft.barcode,
            category: draft.category,
            brand: draft.brand,
            description: draft.description,
            image_url: draft.image_url,
            is_active: existing.is_active,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        // Row write, audit entry, and batch trim commit together
        let mut tx = self.store.begin().await?;
        self.store.products().update_tx(&mut tx, &updated).await?;

        let delta = updated.quantity - existing.quantity;
        if delta != 0 {
            let movement = StockMovement {
                id: Uuid::new_v4().to_string(),
                product_id: updated.id.clone(),
                delta,
                reason: MovementReason::Adjustment,
                note: Some("manual edit".to_string()),
                reference_sale_id: None,
                created_at: updated.updated_at,
            };
            self.store
                .products()
                .record_movement_tx(&mut tx, &movement)
                .await?;
            if delta < 0 {
                self.store
                    .batches()
                    .trim_to_total_tx(&mut tx, &updated.id, updated.quantity)
                    .await?;
            }
        }
        tx.commit().await.map_err(benta_store::StoreError::from)?;

        Ok(updated)
    }

    /// Soft-deletes a product. Its sale history stays intact.
    pub async fn delete_product(&self, id: &str) -> EngineResult<()> {
        match self.store.products().soft_delete(id).await {
            Ok(()) => {
                info!(id = %id, "Product soft-deleted");
                Ok(())
            }
            Err(benta_store::StoreError::NotFound { .. }) => {
                Err(EngineError::not_found("Product", id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Adds stock, optionally tagging the added units with an expiration
    /// date so the expiration watch can alert on them later.
    pub async fn restock(
        &self,
        id: &str,
        quantity: i64,
        notes: Option<&str>,
        expiration_date: Option<NaiveDate>,
    ) -> EngineResult<Product> {
        if quantity <= 0 {
            return Err(EngineError::InvalidQuantity {
                product_id: id.to_string(),
                quantity,
            });
        }

        let _guard = self.locks.acquire(id).await;

        let mut tx = self.store.begin().await?;

        let product = self
            .store
            .products()
            .get_tx(&mut tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", id))?;

        self.store
            .products()
            .adjust_stock_tx(&mut tx, id, quantity)
            .await?;

        if let Some(date) = expiration_date {
            self.store
                .batches()
                .upsert_add_tx(&mut tx, id, date, quantity)
                .await?;
        }

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: id.to_string(),
            delta: quantity,
            reason: MovementReason::Restock,
            note: notes.map(str::to_string),
            reference_sale_id: None,
            created_at: Utc::now(),
        };
        self.store
            .products()
            .record_movement_tx(&mut tx, &movement)
            .await?;

        tx.commit().await.map_err(benta_store::StoreError::from)?;

        info!(id = %id, quantity, "Restocked");

        Ok(Product {
            quantity: product.quantity + quantity,
            ..product
        })
    }
}
