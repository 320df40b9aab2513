//! # Product Repository
//!
//! Database operations for products and the stock movement audit trail.
//!
//! ## Stock Update Strategy
//! ```text
//! WRONG:   UPDATE products SET quantity = 7          (lost updates)
//! CORRECT: UPDATE products SET quantity = quantity - 3   (delta)
//! ```
//! Every stock change is a delta; the schema's `CHECK (quantity >= 0)` is
//! the last line of defense behind the engine's own stock checks.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::str::FromStr;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use benta_core::{MovementReason, Product, StockMovement};

const PRODUCT_COLUMNS: &str = "id, name, price_cents, quantity, min_stock, barcode, \
     category, brand, description, image_url, is_active, created_at, updated_at";

/// Row mapping for `products`.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price_cents: i64,
    quantity: i64,
    min_stock: i64,
    barcode: Option<String>,
    category: Option<String>,
    brand: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id,
            name: r.name,
            price_cents: r.price_cents,
            quantity: r.quantity,
            min_stock: r.min_stock,
            barcode: r.barcode,
            category: r.category,
            brand: r.brand,
            description: r.description,
            image_url: r.image_url,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: String,
    product_id: String,
    delta: i64,
    reason: String,
    note: Option<String>,
    reference_sale_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = StoreError;

    fn try_from(r: MovementRow) -> Result<Self, Self::Error> {
        Ok(StockMovement {
            id: r.id,
            product_id: r.product_id,
            delta: r.delta,
            reason: MovementReason::from_str(&r.reason).map_err(StoreError::Corrupt)?,
            note: r.note,
            reference_sale_id: r.reference_sale_id,
            created_at: r.created_at,
        })
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products sorted by name.
    pub async fn list(&self) -> StoreResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Gets a product by id (active or not).
    pub async fn get(&self, id: &str) -> StoreResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Product::from))
    }

    /// Gets a product by id inside the caller's transaction.
    pub async fn get_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> StoreResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(row.map(Product::from))
    }

    /// Gets an active product by barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> StoreResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1 AND is_active = 1"
        ))
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Checks whether a barcode is already taken by any product.
    pub async fn barcode_exists(&self, barcode: &str) -> StoreResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE barcode = ?1")
                .bind(barcode)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Active products at or under their low-stock threshold (but not out).
    ///
    /// Computed at read time from `quantity` and `min_stock`; never stored.
    pub async fn low_stock(&self) -> StoreResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 AND quantity > 0 AND quantity <= min_stock \
             ORDER BY quantity"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Inserts a new product inside the caller's transaction.
    pub async fn insert_tx(&self, conn: &mut SqliteConnection, product: &Product) -> StoreResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, price_cents, quantity, min_stock, barcode,
                category, brand, description, image_url,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.quantity)
        .bind(product.min_stock)
        .bind(&product.barcode)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Updates an existing product's editable fields inside the caller's
    /// transaction, so the row write commits together with its audit entry.
    pub async fn update_tx(
        &self,
        conn: &mut SqliteConnection,
        product: &Product,
    ) -> StoreResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                price_cents = ?3,
                quantity = ?4,
                min_stock = ?5,
                barcode = ?6,
                category = ?7,
                brand = ?8,
                description = ?9,
                image_url = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.quantity)
        .bind(product.min_stock)
        .bind(&product.barcode)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Applies a stock delta (negative for sales/pulls, positive for
    /// restocks/restores) inside the caller's transaction.
    pub async fn adjust_stock_tx(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        delta: i64,
    ) -> StoreResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product.
    ///
    /// Historical sale lines keep referencing the row, so it is never
    /// physically removed.
    pub async fn soft_delete(&self, id: &str) -> StoreResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", id));
        }

        Ok(())
    }

    /// Appends an audit trail entry inside the caller's transaction.
    pub async fn record_movement_tx(
        &self,
        conn: &mut SqliteConnection,
        movement: &StockMovement,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, product_id, delta, reason, note, reference_sale_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(movement.delta)
        .bind(movement.reason.as_str())
        .bind(&movement.note)
        .bind(&movement.reference_sale_id)
        .bind(movement.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Audit trail for one product, newest first.
    pub async fn movements(&self, product_id: &str) -> StoreResult<Vec<StockMovement>> {
        let rows: Vec<MovementRow> = sqlx::query_as(
            "SELECT id, product_id, delta, reason, note, reference_sale_id, created_at \
             FROM stock_movements WHERE product_id = ?1 ORDER BY created_at DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StockMovement::try_from).collect()
    }
}
