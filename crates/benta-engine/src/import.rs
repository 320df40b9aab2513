//! # Bulk Importer
//!
//! All-or-nothing product import. Every row is validated against the same
//! rules as the single-product add path; one bad row rejects the entire
//! file with per-row errors, and nothing is written.
//!
//! ```text
//! rows ──► parse + validate each ──► any errors? ──► reject all (row list)
//!                                        │
//!                                        ▼ none
//!                                   one transaction: insert all
//! ```

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use benta_core::{validation, Money, MovementReason, Product, StockMovement, DEFAULT_MIN_STOCK};
use benta_store::Store;

use crate::error::{EngineError, EngineResult, RowError};
use crate::stock::ProductDraft;

/// One raw import row. All fields arrive as optional strings; parsing and
/// defaulting happen here, not in the API layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProductRecord {
    pub name: Option<String>,
    pub price: Option<String>,
    #[serde(alias = "stock")]
    pub quantity: Option<String>,
    #[serde(alias = "minStock")]
    pub min_stock: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(alias = "expirationDate")]
    pub expiration_date: Option<String>,
}

/// Validates and imports product records atomically.
#[derive(Debug, Clone)]
pub struct BulkImporter {
    store: Store,
}

impl BulkImporter {
    pub fn new(store: Store) -> Self {
        BulkImporter { store }
    }

    /// Imports all records or none.
    ///
    /// Returns the created products in input order. On failure the error
    /// carries one entry per offending row (1-based row numbers).
    pub async fn import(&self, records: &[RawProductRecord]) -> EngineResult<Vec<Product>> {
        if records.is_empty() {
            return Err(benta_core::ValidationError::Required {
                field: "products".to_string(),
            }
            .into());
        }

        let mut errors: Vec<RowError> = Vec::new();
        let mut drafts: Vec<ProductDraft> = Vec::new();
        let mut seen_barcodes: HashSet<String> = HashSet::new();

        for (index, record) in records.iter().enumerate() {
            let row = index + 1;
            match self.parse_row(record, row, &mut seen_barcodes).await {
                Ok(draft) => drafts.push(draft),
                Err(mut row_errors) => errors.append(&mut row_errors),
            }
        }

        if !errors.is_empty() {
            return Err(EngineError::Import(errors));
        }

        let now = Utc::now();
        let mut products = Vec::with_capacity(drafts.len());

        let mut tx = self.store.begin().await?;
        for draft in drafts {
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
                    note: Some("bulk import".to_string()),
                    reference_sale_id: None,
                    created_at: now,
                };
                self.store
                    .products()
                    .record_movement_tx(&mut tx, &movement)
                    .await?;
            }
            products.push(product);
        }
        tx.commit().await.map_err(benta_store::StoreError::from)?;

        info!(count = products.len(), "Bulk import committed");
        Ok(products)
    }

    /// Parses and validates one row, collecting every field error it finds
    /// so the operator can fix the file in one pass.
    async fn parse_row(
        &self,
        record: &RawProductRecord,
        row: usize,
        seen_barcodes: &mut HashSet<String>,
    ) -> Result<ProductDraft, Vec<RowError>> {
        let mut errors = Vec::new();

        let name = record.name.as_deref().unwrap_or("").trim().to_string();
        if let Err(e) = validation::validate_product_name(&name) {
            errors.push(field_error(row, "name", e));
        }

        let price = match record.price.as_deref().map(str::trim) {
            None | Some("") => Money::zero(),
            Some(raw) => match Decimal::from_str(raw) {
                Ok(pesos) => match Money::from_decimal(pesos) {
                    Ok(money) => {
                        if let Err(e) = validation::validate_price(money) {
                            errors.push(field_error(row, "price", e));
                        }
                        money
                    }
                    Err(e) => {
                        errors.push(field_error(row, "price", e));
                        Money::zero()
                    }
                },
                Err(_) => {
                    errors.push(RowError {
                        row,
                        field: "price".to_string(),
                        message: format!("not a number: '{raw}'"),
                    });
                    Money::zero()
                }
            },
        };

        let quantity = parse_integer(record.quantity.as_deref(), 0, row, "quantity", &mut errors);
        if let Err(e) = validation::validate_stock_quantity(quantity) {
            errors.push(field_error(row, "quantity", e));
        }

        let min_stock = parse_integer(
            record.min_stock.as_deref(),
            DEFAULT_MIN_STOCK,
            row,
            "min_stock",
            &mut errors,
        );
        if let Err(e) = validation::validate_min_stock(min_stock) {
            errors.push(field_error(row, "min_stock", e));
        }

        let barcode = record
            .barcode
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string);
        if let Some(barcode) = &barcode {
            if let Err(e) = validation::validate_barcode(barcode) {
                errors.push(field_error(row, "barcode", e));
            } else if !seen_barcodes.insert(barcode.clone()) {
                errors.push(RowError {
                    row,
                    field: "barcode".to_string(),
                    message: format!("'{barcode}' appears more than once in the file"),
                });
            } else {
                match self.store.products().barcode_exists(barcode).await {
                    Ok(true) => errors.push(RowError {
                        row,
                        field: "barcode".to_string(),
                        message: format!("'{barcode}' already exists"),
                    }),
                    Ok(false) => {}
                    Err(e) => errors.push(RowError {
                        row,
                        field: "barcode".to_string(),
                        message: e.to_string(),
                    }),
                }
            }
        }

        let expiration_date = match record.expiration_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match chrono::NaiveDate::from_str(raw) {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push(RowError {
                        row,
                        field: "expiration_date".to_string(),
                        message: format!("not a date (expected YYYY-MM-DD): '{raw}'"),
                    });
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ProductDraft {
            name,
            price,
            quantity,
            min_stock,
            barcode,
            category: clean_optional(record.category.as_deref()),
            brand: clean_optional(record.brand.as_deref()),
            description: clean_optional(record.description.as_deref()),
            image_url: clean_optional(record.image_url.as_deref()),
            expiration_date,
        })
    }
}

fn field_error(row: usize, field: &str, err: benta_core::ValidationError) -> RowError {
    RowError {
        row,
        field: field.to_string(),
        message: err.to_string(),
    }
}

fn parse_integer(
    raw: Option<&str>,
    default: i64,
    row: usize,
    field: &str,
    errors: &mut Vec<RowError>,
) -> i64 {
    match raw.map(str::trim) {
        None | Some("") => default,
        Some(raw) => match raw.parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                errors.push(RowError {
                    row,
                    field: field.to_string(),
                    message: format!("not a whole number: '{raw}'"),
                });
                default
            }
        },
    }
}

fn clean_optional(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
