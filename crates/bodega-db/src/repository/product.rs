//! # Product Repository
//!
//! Database operations for products and their alternate UOMs.
//!
//! ## Key Operations
//! - CRUD over products
//! - Alternate UOM persistence (one row per UOM, replaced on update)
//! - SKU lookup for POS entry
//!
//! ## UOM Storage
//! ```text
//! products          product_uoms
//! ┌──────────────┐  ┌──────────────────────────────────┐
//! │ id           │◄─┤ product_id                       │
//! │ base_uom     │  │ name      ("case")               │
//! │ base_price   │  │ factor    ("24")                 │
//! │ ...          │  │ price     ("216.00")             │
//! └──────────────┘  └──────────────────────────────────┘
//! ```
//! A `Product` is always loaded with its alternate UOMs attached, so
//! `to_base_uom` and price resolution never need a second round trip.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use bodega_core::validation::validate_money;
use bodega_core::Product;

use crate::error::{DbError, DbResult};
use crate::repository::get_decimal;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get_by_sku("RICE-25KG").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product together with its alternate UOMs.
    ///
    /// ## Validation
    /// Runs `Product::validate_uoms()` (unique names, not equal to base UOM,
    /// positive factors) and checks the base price is non-negative before
    /// touching the database.
    ///
    /// ## Returns
    /// * `Ok(())` - Inserted
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        product.validate_uoms().map_err(DbError::from)?;
        validate_money("base_price", product.base_price)?;
        validate_money("min_stock_level", product.min_stock_level)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, base_uom, base_price,
                min_stock_level, shelf_life_days, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.base_uom)
        .bind(product.base_price.to_string())
        .bind(product.min_stock_level.to_string())
        .bind(product.shelf_life_days)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        for uom in &product.alternate_uoms {
            sqlx::query(
                r#"
                INSERT INTO product_uoms (id, product_id, name, factor, price)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&product.id)
            .bind(&uom.name)
            .bind(uom.factor.to_string())
            .bind(uom.price.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets a product by its ID, with alternate UOMs attached.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        load_product(&mut conn, id).await
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query("SELECT id FROM products WHERE sku = ?1")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let id: String = row.try_get("id")?;
                self.get_by_id(&id).await
            }
            None => Ok(None),
        }
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id FROM products
            WHERE is_active = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            if let Some(product) = load_product(&mut conn, &id).await? {
                products.push(product);
            }
        }

        Ok(products)
    }

    /// Updates an existing product. Alternate UOMs are replaced wholesale:
    /// the old rows are deleted and the product's current set re-inserted.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        product.validate_uoms().map_err(DbError::from)?;
        validate_money("base_price", product.base_price)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                name = ?3,
                base_uom = ?4,
                base_price = ?5,
                min_stock_level = ?6,
                shelf_life_days = ?7,
                is_active = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.base_uom)
        .bind(product.base_price.to_string())
        .bind(product.min_stock_level.to_string())
        .bind(product.shelf_life_days)
        .bind(product.is_active)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        sqlx::query("DELETE FROM product_uoms WHERE product_id = ?1")
            .bind(&product.id)
            .execute(&mut *tx)
            .await?;

        for uom in &product.alternate_uoms {
            sqlx::query(
                r#"
                INSERT INTO product_uoms (id, product_id, name, factor, price)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&product.id)
            .bind(&uom.name)
            .bind(uom.factor.to_string())
            .bind(uom.price.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical sale items still reference the product, so rows are
    /// never physically removed.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = 0, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-Level Helpers
// =============================================================================

/// Loads a product (with alternate UOMs) on an existing connection.
///
/// Takes `&mut SqliteConnection` rather than the pool so the sale
/// orchestrator can call it inside its own transaction.
pub(crate) async fn load_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let row = sqlx::query(
        r#"
        SELECT id, sku, name, base_uom, base_price, min_stock_level,
               shelf_life_days, is_active, created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut product = map_product(&row)?;

    let uom_rows = sqlx::query(
        r#"
        SELECT name, factor, price
        FROM product_uoms
        WHERE product_id = ?1
        ORDER BY name
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    for uom_row in &uom_rows {
        product.alternate_uoms.push(bodega_core::AlternateUom {
            name: uom_row.try_get("name")?,
            factor: get_decimal(uom_row, "factor")?,
            price: get_decimal(uom_row, "price")?,
        });
    }

    Ok(Some(product))
}

fn map_product(row: &SqliteRow) -> DbResult<Product> {
    Ok(Product {
        id: row.try_get("id")?,
        sku: row.try_get("sku")?,
        name: row.try_get("name")?,
        base_uom: row.try_get("base_uom")?,
        base_price: get_decimal(row, "base_price")?,
        min_stock_level: get_decimal(row, "min_stock_level")?,
        shelf_life_days: row.try_get("shelf_life_days")?,
        is_active: row.try_get("is_active")?,
        alternate_uoms: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
