//! # Inventory Repository
//!
//! Batch-level stock operations: receiving, FIFO-by-expiry deduction,
//! adjustment, expiry sweeps, and the low-stock report.
//!
//! ## Atomicity
//! ```text
//! deduct_stock
//!   ├── BEGIN
//!   ├── load active batches (expiry order)
//!   ├── bodega_core::stock::plan_deduction   ← sufficiency verified here,
//!   │                                          before any row changes
//!   ├── apply each BatchDraw (UPDATE + movement row)
//!   └── COMMIT          any failure above rolls the whole thing back
//! ```
//! The same `deduct_on_conn` helper runs inside the sale orchestrator's
//! transaction, so a multi-line sale deducts all lines or none.
//!
//! ## Audit Trail
//! Every batch mutation writes a `stock_movements` row carrying the signed
//! quantity delta and a mandatory reason.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use bodega_core::stock::{self, BatchDraw};
use bodega_core::validation::{
    validate_batch_number, validate_money, validate_quantity, validate_reason,
};
use bodega_core::{BatchStatus, InventoryBatch, ValidationError};

use crate::error::{DbError, DbResult};
use crate::repository::{get_decimal, get_enum, get_opt_decimal};

// =============================================================================
// Inputs and Report Rows
// =============================================================================

/// Input for receiving a new batch of stock.
#[derive(Debug, Clone)]
pub struct ReceiveStock {
    pub product_id: String,
    pub warehouse_id: String,
    /// Business identifier, unique across all batches.
    pub batch_number: String,
    /// Quantity in base UOM. Must be positive.
    pub quantity: Decimal,
    /// Cost per base unit. Must be non-negative.
    pub unit_cost: Decimal,
    /// Explicit expiry date; when absent, defaults to the received date
    /// plus the product's shelf life.
    pub expiry_date: Option<NaiveDate>,
    /// Defaults to today.
    pub received_date: Option<NaiveDate>,
}

/// One row of the low-stock report.
#[derive(Debug, Clone)]
pub struct LowStockItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub min_stock_level: Decimal,
    /// Total consumable quantity in base UOM.
    pub available: Decimal,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for inventory batch operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Receives a batch of stock into a warehouse.
    ///
    /// ## What This Does
    /// 1. Validates quantity, cost, and batch number format
    /// 2. Enforces the warehouse capacity ceiling (when one is set)
    /// 3. Resolves the expiry date (explicit, or received + shelf life)
    /// 4. Inserts the batch and logs a `receive` movement
    ///
    /// ## Errors
    /// * `DbError::Domain(CoreError::CapacityExceeded)` - ceiling breached
    /// * `DbError::UniqueViolation` - batch number already exists
    pub async fn add_batch(&self, input: &ReceiveStock) -> DbResult<InventoryBatch> {
        validate_quantity(input.quantity)?;
        validate_money("unit_cost", input.unit_cost)?;
        validate_batch_number(&input.batch_number)?;

        debug!(
            product_id = %input.product_id,
            batch_number = %input.batch_number,
            quantity = %input.quantity,
            "Receiving stock"
        );

        let mut tx = self.pool.begin().await?;

        // Capacity check: total active stock across ALL products in this
        // warehouse, plus the incoming quantity, against the ceiling.
        let capacity_row = sqlx::query("SELECT max_capacity FROM warehouses WHERE id = ?1")
            .bind(&input.warehouse_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Warehouse", &input.warehouse_id))?;
        let max_capacity = get_opt_decimal(&capacity_row, "max_capacity")?;

        let current_total = warehouse_active_total(&mut tx, &input.warehouse_id).await?;

        stock::check_capacity(current_total, input.quantity, max_capacity)
            .map_err(DbError::Domain)?;

        let received_date = input
            .received_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let expiry_date = match input.expiry_date {
            Some(date) => date,
            None => {
                let shelf_life: Option<i64> =
                    sqlx::query_scalar("SELECT shelf_life_days FROM products WHERE id = ?1")
                        .bind(&input.product_id)
                        .fetch_optional(&mut *tx)
                        .await?
                        .ok_or_else(|| DbError::not_found("Product", &input.product_id))?;

                match shelf_life {
                    Some(days) => received_date + chrono::Duration::days(days),
                    None => {
                        return Err(ValidationError::Required {
                            field: "expiry_date".to_string(),
                        }
                        .into())
                    }
                }
            }
        };

        let batch = InventoryBatch {
            id: Uuid::new_v4().to_string(),
            product_id: input.product_id.clone(),
            warehouse_id: input.warehouse_id.clone(),
            batch_number: input.batch_number.clone(),
            quantity: input.quantity,
            unit_cost: input.unit_cost,
            expiry_date,
            received_date,
            status: BatchStatus::Active,
        };

        sqlx::query(
            r#"
            INSERT INTO inventory_batches (
                id, product_id, warehouse_id, batch_number,
                quantity, unit_cost, expiry_date, received_date, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&batch.id)
        .bind(&batch.product_id)
        .bind(&batch.warehouse_id)
        .bind(&batch.batch_number)
        .bind(batch.quantity.to_string())
        .bind(batch.unit_cost.to_string())
        .bind(batch.expiry_date)
        .bind(batch.received_date)
        .bind(batch.status.as_str())
        .execute(&mut *tx)
        .await?;

        insert_movement(
            &mut tx,
            &batch.id,
            "receive",
            input.quantity,
            "stock received",
            None,
            None,
        )
        .await?;

        tx.commit().await?;

        info!(batch_id = %batch.id, batch_number = %batch.batch_number, "Batch received");
        Ok(batch)
    }

    /// Gets a batch by its ID.
    pub async fn get_batch(&self, id: &str) -> DbResult<Option<InventoryBatch>> {
        let row = sqlx::query(
            r#"
            SELECT id, product_id, warehouse_id, batch_number, quantity,
                   unit_cost, expiry_date, received_date, status
            FROM inventory_batches
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_batch).transpose()
    }

    /// Lists a product's batches at a warehouse, all statuses, expiry order.
    pub async fn batches_for_product(
        &self,
        product_id: &str,
        warehouse_id: &str,
    ) -> DbResult<Vec<InventoryBatch>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, warehouse_id, batch_number, quantity,
                   unit_cost, expiry_date, received_date, status
            FROM inventory_batches
            WHERE product_id = ?1 AND warehouse_id = ?2
            ORDER BY expiry_date, received_date, id
            "#,
        )
        .bind(product_id)
        .bind(warehouse_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_batch).collect()
    }

    /// Current weighted-average cost for a product at a warehouse.
    ///
    /// Derived from the live batch set; zero when no active stock exists.
    pub async fn average_cost(&self, product_id: &str, warehouse_id: &str) -> DbResult<Decimal> {
        let mut conn = self.pool.acquire().await?;
        let batches = load_active_batches(&mut conn, product_id, warehouse_id).await?;
        Ok(stock::weighted_average_cost(&batches))
    }

    /// Total consumable quantity for a product at a warehouse, in base UOM.
    pub async fn available(&self, product_id: &str, warehouse_id: &str) -> DbResult<Decimal> {
        let mut conn = self.pool.acquire().await?;
        let batches = load_active_batches(&mut conn, product_id, warehouse_id).await?;
        Ok(stock::available_quantity(&batches))
    }

    /// Warehouse-wide active stock across ALL products, in base UOM.
    ///
    /// This is the same figure the capacity check measures against the
    /// warehouse ceiling on receiving.
    pub async fn total_stock(&self, warehouse_id: &str) -> DbResult<Decimal> {
        let mut conn = self.pool.acquire().await?;
        warehouse_active_total(&mut conn, warehouse_id).await
    }

    /// Deducts stock FIFO-by-expiry across a product's batches.
    ///
    /// All-or-nothing: insufficiency is detected before any batch changes,
    /// and all batch updates plus movement rows commit together. The
    /// optional reference pair cites the source document on every movement
    /// row (the sale orchestrator tags its deductions with the receipt
    /// number the same way).
    ///
    /// ## Errors
    /// `DbError::Domain(CoreError::InsufficientStock)` when consumable stock
    /// is less than `quantity`.
    pub async fn deduct_stock(
        &self,
        product_id: &str,
        warehouse_id: &str,
        quantity: Decimal,
        reason: &str,
        reference_id: Option<&str>,
        reference_type: Option<&str>,
    ) -> DbResult<Vec<BatchDraw>> {
        validate_reason(reason)?;

        let mut tx = self.pool.begin().await?;
        let draws = deduct_on_conn(
            &mut tx,
            product_id,
            warehouse_id,
            quantity,
            reason,
            reference_id,
            reference_type,
        )
        .await?;
        tx.commit().await?;

        info!(
            product_id = %product_id,
            quantity = %quantity,
            batches = draws.len(),
            "Stock deducted"
        );
        Ok(draws)
    }

    /// Sets a batch's quantity to an absolute value (stocktake correction).
    ///
    /// ## Status Recompute
    /// - new quantity 0 → `depleted`
    /// - new quantity > 0 on a depleted batch → back to `active`
    /// - expired batches stay `expired` regardless of quantity
    pub async fn adjust_batch(
        &self,
        batch_id: &str,
        new_quantity: Decimal,
        reason: &str,
    ) -> DbResult<InventoryBatch> {
        if new_quantity < Decimal::ZERO {
            return Err(ValidationError::MustNotBeNegative {
                field: "quantity".to_string(),
            }
            .into());
        }
        validate_reason(reason)?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT id, product_id, warehouse_id, batch_number, quantity,
                   unit_cost, expiry_date, received_date, status
            FROM inventory_batches
            WHERE id = ?1
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Batch", batch_id))?;

        let mut batch = map_batch(&row)?;
        let delta = new_quantity - batch.quantity;

        let new_status = match batch.status {
            BatchStatus::Expired => BatchStatus::Expired,
            _ if new_quantity.is_zero() => BatchStatus::Depleted,
            _ => BatchStatus::Active,
        };

        sqlx::query("UPDATE inventory_batches SET quantity = ?2, status = ?3 WHERE id = ?1")
            .bind(batch_id)
            .bind(new_quantity.to_string())
            .bind(new_status.as_str())
            .execute(&mut *tx)
            .await?;

        insert_movement(&mut tx, batch_id, "adjust", delta, reason, None, None).await?;

        tx.commit().await?;

        batch.quantity = new_quantity;
        batch.status = new_status;

        info!(batch_id = %batch_id, delta = %delta, "Batch adjusted");
        Ok(batch)
    }

    /// Marks active batches past their expiry date as `expired`.
    ///
    /// Run daily; expired batches drop out of costing, deduction, and
    /// capacity accounting immediately. Returns the number of batches swept.
    pub async fn mark_expired_batches(&self, today: NaiveDate) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_batches
            SET status = 'expired'
            WHERE status = 'active' AND expiry_date < ?1
            "#,
        )
        .bind(today)
        .execute(&self.pool)
        .await?;

        let swept = result.rows_affected();
        if swept > 0 {
            info!(count = swept, "Expired batches swept");
        }
        Ok(swept)
    }

    /// Active products whose consumable stock at the warehouse is at or
    /// below their minimum stock level.
    pub async fn low_stock(&self, warehouse_id: &str) -> DbResult<Vec<LowStockItem>> {
        let product_rows = sqlx::query(
            r#"
            SELECT id, sku, name, min_stock_level
            FROM products
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        let mut report = Vec::new();

        for row in &product_rows {
            let product_id: String = row.try_get("id")?;
            let min_stock_level = get_decimal(row, "min_stock_level")?;

            let batches = load_active_batches(&mut conn, &product_id, warehouse_id).await?;
            let available = stock::available_quantity(&batches);

            if available <= min_stock_level {
                report.push(LowStockItem {
                    product_id,
                    sku: row.try_get("sku")?,
                    name: row.try_get("name")?,
                    min_stock_level,
                    available,
                });
            }
        }

        Ok(report)
    }
}

// =============================================================================
// Connection-Level Helpers
// =============================================================================

/// Loads a product's active batches at a warehouse in consumption order
/// (expiry ascending, ties by received date then id).
pub(crate) async fn load_active_batches(
    conn: &mut SqliteConnection,
    product_id: &str,
    warehouse_id: &str,
) -> DbResult<Vec<InventoryBatch>> {
    let rows = sqlx::query(
        r#"
        SELECT id, product_id, warehouse_id, batch_number, quantity,
               unit_cost, expiry_date, received_date, status
        FROM inventory_batches
        WHERE product_id = ?1 AND warehouse_id = ?2 AND status = 'active'
        ORDER BY expiry_date, received_date, id
        "#,
    )
    .bind(product_id)
    .bind(warehouse_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(map_batch).collect()
}

/// Sums active stock across all products at a warehouse, in base UOM.
///
/// Quantities are decimal TEXT, so the fold happens here rather than in
/// a SQL SUM.
pub(crate) async fn warehouse_active_total(
    conn: &mut SqliteConnection,
    warehouse_id: &str,
) -> DbResult<Decimal> {
    let rows = sqlx::query(
        "SELECT quantity FROM inventory_batches WHERE warehouse_id = ?1 AND status = 'active'",
    )
    .bind(warehouse_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut total = Decimal::ZERO;
    for row in &rows {
        total += get_decimal(row, "quantity")?;
    }
    Ok(total)
}

/// Plans and applies a deduction on an existing connection.
///
/// Callers that need multi-line atomicity (the sale orchestrator) pass
/// their own transaction connection; `deduct_stock` wraps this in a
/// transaction of its own.
pub(crate) async fn deduct_on_conn(
    conn: &mut SqliteConnection,
    product_id: &str,
    warehouse_id: &str,
    quantity: Decimal,
    reason: &str,
    reference_id: Option<&str>,
    reference_type: Option<&str>,
) -> DbResult<Vec<BatchDraw>> {
    let batches = load_active_batches(conn, product_id, warehouse_id).await?;
    let draws = stock::plan_deduction(&batches, quantity).map_err(DbError::Domain)?;

    for draw in &draws {
        let status = if draw.depletes {
            BatchStatus::Depleted
        } else {
            BatchStatus::Active
        };

        sqlx::query("UPDATE inventory_batches SET quantity = ?2, status = ?3 WHERE id = ?1")
            .bind(&draw.batch_id)
            .bind(draw.remaining.to_string())
            .bind(status.as_str())
            .execute(&mut *conn)
            .await?;

        insert_movement(
            conn,
            &draw.batch_id,
            "deduct",
            -draw.quantity,
            reason,
            reference_id,
            reference_type,
        )
        .await?;
    }

    Ok(draws)
}

/// Appends a stock movement audit row.
pub(crate) async fn insert_movement(
    conn: &mut SqliteConnection,
    batch_id: &str,
    movement_type: &str,
    quantity_delta: Decimal,
    reason: &str,
    reference_id: Option<&str>,
    reference_type: Option<&str>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, batch_id, movement_type, quantity_delta,
            reason, reference_id, reference_type, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(batch_id)
    .bind(movement_type)
    .bind(quantity_delta.to_string())
    .bind(reason)
    .bind(reference_id)
    .bind(reference_type)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn map_batch(row: &SqliteRow) -> DbResult<InventoryBatch> {
    Ok(InventoryBatch {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        warehouse_id: row.try_get("warehouse_id")?,
        batch_number: row.try_get("batch_number")?,
        quantity: get_decimal(row, "quantity")?,
        unit_cost: get_decimal(row, "unit_cost")?,
        expiry_date: row.try_get("expiry_date")?,
        received_date: row.try_get("received_date")?,
        status: get_enum(row, "status")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::{d, seed_product, seed_warehouse, test_db};
    use crate::DbError;
    use bodega_core::CoreError;

    fn receive(
        product_id: &str,
        warehouse_id: &str,
        batch_number: &str,
        quantity: &str,
        unit_cost: &str,
        expiry: NaiveDate,
    ) -> ReceiveStock {
        ReceiveStock {
            product_id: product_id.to_string(),
            warehouse_id: warehouse_id.to_string(),
            batch_number: batch_number.to_string(),
            quantity: d(quantity),
            unit_cost: d(unit_cost),
            expiry_date: Some(expiry),
            received_date: Some(NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()),
        }
    }

    fn date(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_add_batch_and_average_cost() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "MILK-1L", None).await;
        let inv = db.inventory();

        inv.add_batch(&receive(&product.id, &wh, "B-1", "100", "5.00", date(2026, 6, 1)))
            .await
            .unwrap();
        inv.add_batch(&receive(&product.id, &wh, "B-2", "50", "8.00", date(2026, 7, 1)))
            .await
            .unwrap();

        // (100×5 + 50×8) / 150 = 900/150 = 6
        let avg = inv.average_cost(&product.id, &wh).await.unwrap();
        assert_eq!(avg, d("6"));
        assert_eq!(inv.available(&product.id, &wh).await.unwrap(), d("150"));
    }

    #[tokio::test]
    async fn test_expiry_defaults_from_shelf_life() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        // seed_product sets shelf_life_days = 180
        let product = seed_product(&db, "YOG-500G", None).await;

        let mut input = receive(&product.id, &wh, "B-1", "10", "2.00", date(2026, 1, 1));
        input.expiry_date = None;
        let batch = db.inventory().add_batch(&input).await.unwrap();

        assert_eq!(batch.expiry_date, date(2026, 1, 10) + chrono::Duration::days(180));
    }

    #[tokio::test]
    async fn test_capacity_exceeded() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Small", Some("100")).await;
        let product = seed_product(&db, "RICE-25KG", None).await;
        let inv = db.inventory();

        inv.add_batch(&receive(&product.id, &wh, "B-1", "80", "5.00", date(2026, 6, 1)))
            .await
            .unwrap();

        let err = inv
            .add_batch(&receive(&product.id, &wh, "B-2", "30", "5.00", date(2026, 6, 1)))
            .await
            .unwrap_err();
        match err {
            DbError::Domain(CoreError::CapacityExceeded { excess }) => {
                assert_eq!(excess, d("10"));
            }
            other => panic!("expected CapacityExceeded, got {other:?}"),
        }

        // Exactly at the ceiling is allowed
        inv.add_batch(&receive(&product.id, &wh, "B-3", "20", "5.00", date(2026, 6, 1)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_batch_number() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "TEA-100", None).await;
        let inv = db.inventory();

        inv.add_batch(&receive(&product.id, &wh, "B-1", "10", "1.00", date(2026, 6, 1)))
            .await
            .unwrap();
        let err = inv
            .add_batch(&receive(&product.id, &wh, "B-1", "10", "1.00", date(2026, 6, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_deduct_fifo_by_expiry_and_depletion_persists() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "BREAD", None).await;
        let inv = db.inventory();

        // Later expiry received first: consumption must still start with B-2
        let b1 = inv
            .add_batch(&receive(&product.id, &wh, "B-1", "50", "4.00", date(2026, 9, 1)))
            .await
            .unwrap();
        let b2 = inv
            .add_batch(&receive(&product.id, &wh, "B-2", "50", "4.50", date(2026, 3, 1)))
            .await
            .unwrap();

        let draws = inv
            .deduct_stock(&product.id, &wh, d("60"), "sale", None, None)
            .await
            .unwrap();

        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].batch_id, b2.id);
        assert_eq!(draws[0].quantity, d("50"));
        assert!(draws[0].depletes);
        assert_eq!(draws[1].batch_id, b1.id);
        assert_eq!(draws[1].quantity, d("10"));

        let stored_b2 = inv.get_batch(&b2.id).await.unwrap().unwrap();
        assert_eq!(stored_b2.quantity, Decimal::ZERO);
        assert_eq!(stored_b2.status, BatchStatus::Depleted);

        let stored_b1 = inv.get_batch(&b1.id).await.unwrap().unwrap();
        assert_eq!(stored_b1.quantity, d("40"));
        assert_eq!(stored_b1.status, BatchStatus::Active);
    }

    #[tokio::test]
    async fn test_deduct_insufficient_leaves_stock_unchanged() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "SODA", None).await;
        let inv = db.inventory();

        inv.add_batch(&receive(&product.id, &wh, "B-1", "30", "2.00", date(2026, 6, 1)))
            .await
            .unwrap();

        let err = inv
            .deduct_stock(&product.id, &wh, d("31"), "sale", None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { .. })
        ));

        assert_eq!(inv.available(&product.id, &wh).await.unwrap(), d("30"));
    }

    #[tokio::test]
    async fn test_adjust_batch_status_recompute() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "JAM", None).await;
        let inv = db.inventory();

        let batch = inv
            .add_batch(&receive(&product.id, &wh, "B-1", "10", "3.00", date(2026, 6, 1)))
            .await
            .unwrap();

        let adjusted = inv
            .adjust_batch(&batch.id, Decimal::ZERO, "stocktake: all damaged")
            .await
            .unwrap();
        assert_eq!(adjusted.status, BatchStatus::Depleted);

        let restored = inv
            .adjust_batch(&batch.id, d("4"), "stocktake: found 4")
            .await
            .unwrap();
        assert_eq!(restored.status, BatchStatus::Active);
        assert_eq!(restored.quantity, d("4"));
    }

    #[tokio::test]
    async fn test_adjust_expired_batch_stays_expired() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "CHEESE", None).await;
        let inv = db.inventory();

        let batch = inv
            .add_batch(&receive(&product.id, &wh, "B-1", "10", "3.00", date(2026, 1, 15)))
            .await
            .unwrap();
        inv.mark_expired_batches(date(2026, 2, 1)).await.unwrap();

        let adjusted = inv
            .adjust_batch(&batch.id, d("8"), "stocktake")
            .await
            .unwrap();
        assert_eq!(adjusted.status, BatchStatus::Expired);
    }

    #[tokio::test]
    async fn test_mark_expired_excludes_from_costing() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "FISH", None).await;
        let inv = db.inventory();

        inv.add_batch(&receive(&product.id, &wh, "B-1", "10", "9.00", date(2026, 1, 15)))
            .await
            .unwrap();
        inv.add_batch(&receive(&product.id, &wh, "B-2", "10", "5.00", date(2026, 12, 1)))
            .await
            .unwrap();

        let swept = inv.mark_expired_batches(date(2026, 2, 1)).await.unwrap();
        assert_eq!(swept, 1);

        // Only the fresh batch participates now
        assert_eq!(inv.average_cost(&product.id, &wh).await.unwrap(), d("5.00"));
        assert_eq!(inv.available(&product.id, &wh).await.unwrap(), d("10"));

        // Expiry exactly today is NOT yet expired
        let swept_again = inv.mark_expired_batches(date(2026, 12, 1)).await.unwrap();
        assert_eq!(swept_again, 0);
    }

    #[tokio::test]
    async fn test_total_stock_spans_products_and_skips_inactive_batches() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let other = seed_warehouse(&db, "Annex", None).await;
        let rice = seed_product(&db, "RICE-25KG", None).await;
        let sugar = seed_product(&db, "SUGAR-1KG", None).await;
        let inv = db.inventory();

        inv.add_batch(&receive(&rice.id, &wh, "B-1", "40", "5.00", date(2026, 1, 15)))
            .await
            .unwrap();
        inv.add_batch(&receive(&sugar.id, &wh, "B-2", "25", "1.00", date(2026, 12, 1)))
            .await
            .unwrap();
        inv.add_batch(&receive(&rice.id, &other, "B-3", "500", "5.00", date(2026, 12, 1)))
            .await
            .unwrap();

        assert_eq!(inv.total_stock(&wh).await.unwrap(), d("65"));
        assert_eq!(inv.total_stock(&other).await.unwrap(), d("500"));

        // Expired stock drops out of the warehouse total, matching what
        // the capacity check measures against the ceiling
        inv.mark_expired_batches(date(2026, 2, 1)).await.unwrap();
        assert_eq!(inv.total_stock(&wh).await.unwrap(), d("25"));
    }

    #[tokio::test]
    async fn test_deduct_stock_tags_movements_with_reference() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "FLOUR-1KG", None).await;
        let inv = db.inventory();

        let batch = inv
            .add_batch(&receive(&product.id, &wh, "B-1", "20", "2.00", date(2026, 6, 1)))
            .await
            .unwrap();

        inv.deduct_stock(
            &product.id,
            &wh,
            d("5"),
            "damaged in transit",
            Some("GRN-0042"),
            Some("goods_return"),
        )
        .await
        .unwrap();

        let row = sqlx::query(
            "SELECT reference_id, reference_type FROM stock_movements \
             WHERE batch_id = ?1 AND movement_type = 'deduct'",
        )
        .bind(&batch.id)
        .fetch_one(db.pool())
        .await
        .unwrap();

        let reference_id: Option<String> = row.try_get("reference_id").unwrap();
        let reference_type: Option<String> = row.try_get("reference_type").unwrap();
        assert_eq!(reference_id.as_deref(), Some("GRN-0042"));
        assert_eq!(reference_type.as_deref(), Some("goods_return"));
    }

    #[tokio::test]
    async fn test_low_stock_report() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        // min_stock_level is 20 from the seed helper
        let low = seed_product(&db, "LOW-1", None).await;
        let ok = seed_product(&db, "OK-1", None).await;
        let inv = db.inventory();

        inv.add_batch(&receive(&low.id, &wh, "B-1", "15", "1.00", date(2026, 6, 1)))
            .await
            .unwrap();
        inv.add_batch(&receive(&ok.id, &wh, "B-2", "100", "1.00", date(2026, 6, 1)))
            .await
            .unwrap();

        let report = inv.low_stock(&wh).await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].sku, "LOW-1");
        assert_eq!(report[0].available, d("15"));
    }
}
