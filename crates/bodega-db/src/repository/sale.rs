//! # Sale Repository
//!
//! The POS sale orchestrator: one call, one transaction, every side effect
//! or none of them.
//!
//! ## Transaction Shape
//! ```text
//! process_sale
//!   ├── BEGIN
//!   ├── resolve receipt number (supplied → collision check,
//!   │                           otherwise max+1 for today)
//!   ├── per line, in caller order:
//!   │     resolve price for the selling UOM
//!   │     weighted average cost  → COGS snapshot
//!   │     convert to base UOM    → FIFO-by-expiry deduction
//!   ├── discounts → VAT → totals (cash: tender/change)
//!   ├── INSERT sale header + line items
//!   ├── sales order? mark converted + link
//!   ├── credit?      INSERT receivable obligation
//!   └── COMMIT
//! ```
//! A failure at any step (insufficient stock on line 3, a duplicate
//! receipt, a closed sales order) rolls back everything. There is no
//! compensating logic anywhere.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use bodega_core::money::round_money;
use bodega_core::pricing::{self, PricedLine};
use bodega_core::receipt::{next_receipt_number, receipt_prefix};
use bodega_core::stock;
use bodega_core::validation::{validate_quantity, validate_sale_items};
use bodega_core::{
    CoreError, DiscountKind, Obligation, ObligationKind, ObligationStatus, PaymentMethod, PosSale,
    PosSaleItem, ValidationError, VatConfig,
};

use crate::error::{DbError, DbResult};
use crate::repository::inventory::{deduct_on_conn, load_active_batches};
use crate::repository::obligation::insert_obligation_on_conn;
use crate::repository::product::load_product;
use crate::repository::{get_decimal, get_enum, get_opt_decimal, get_opt_enum};

/// Days until a credit sale's receivable falls due, when the caller
/// doesn't specify.
const DEFAULT_CREDIT_TERMS_DAYS: i64 = 30;

// =============================================================================
// Inputs / Outputs
// =============================================================================

/// One cart line as entered at the terminal.
#[derive(Debug, Clone)]
pub struct SaleItemInput {
    pub product_id: String,
    /// Quantity in the selling UOM.
    pub quantity: Decimal,
    /// Base UOM name or an alternate UOM name of the product.
    pub uom: String,
    pub discount_kind: Option<DiscountKind>,
    pub discount_value: Option<Decimal>,
}

/// Everything `process_sale` needs.
#[derive(Debug, Clone)]
pub struct SaleInput {
    pub branch_id: String,
    /// Warehouse stock is deducted from.
    pub warehouse_id: String,
    pub items: Vec<SaleItemInput>,
    /// Transaction-level discount, applied after item discounts.
    pub discount_kind: Option<DiscountKind>,
    pub discount_value: Option<Decimal>,
    pub discount_reason: Option<String>,
    pub payment_method: PaymentMethod,
    /// Required for cash sales.
    pub amount_received: Option<Decimal>,
    /// Explicit receipt number; generated from today's sequence when absent.
    pub receipt_number: Option<String>,
    /// Required for credit sales (becomes the obligation counterparty).
    pub customer_name: Option<String>,
    /// Credit sales: when the receivable falls due. Defaults to 30 days out.
    pub due_date: Option<NaiveDate>,
    /// Open sales order this sale converts, if any.
    pub sales_order_id: Option<String>,
}

/// A committed sale with its line items.
#[derive(Debug, Clone)]
pub struct CompletedSale {
    pub sale: PosSale,
    pub items: Vec<PosSaleItem>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for POS sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Processes a complete POS sale in a single transaction.
    ///
    /// The VAT configuration comes from the caller (read once from company
    /// settings) so a settings change mid-transaction can't split a sale's
    /// arithmetic.
    ///
    /// ## Errors
    /// * `CoreError::InsufficientStock` - any line short on stock
    /// * `CoreError::UnknownUom` - selling UOM the product doesn't carry
    /// * `CoreError::DuplicateReceiptNumber` - supplied number collides
    /// * `ValidationError::InsufficientTender` - cash below the total
    /// * `DbError::NotFound` - product, or sales order no longer open
    pub async fn process_sale(
        &self,
        input: &SaleInput,
        vat_config: &VatConfig,
    ) -> DbResult<CompletedSale> {
        validate_sale_items(input.items.len())?;
        for item in &input.items {
            validate_quantity(item.quantity)?;
        }

        debug!(
            branch_id = %input.branch_id,
            lines = input.items.len(),
            method = input.payment_method.as_str(),
            "Processing sale"
        );

        let mut tx = self.pool.begin().await?;

        let today = Utc::now().date_naive();
        let receipt_number = match &input.receipt_number {
            Some(number) => {
                let existing: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM pos_sales WHERE receipt_number = ?1")
                        .bind(number)
                        .fetch_one(&mut *tx)
                        .await?;
                if existing > 0 {
                    return Err(DbError::Domain(CoreError::DuplicateReceiptNumber(
                        number.clone(),
                    )));
                }
                number.clone()
            }
            None => {
                let rows = sqlx::query(
                    "SELECT receipt_number FROM pos_sales WHERE receipt_number LIKE ?1",
                )
                .bind(format!("{}-%", receipt_prefix(today)))
                .fetch_all(&mut *tx)
                .await?;

                let mut existing = Vec::with_capacity(rows.len());
                for row in &rows {
                    existing.push(row.try_get::<String, _>("receipt_number")?);
                }
                next_receipt_number(today, &existing)
            }
        };

        let sale_id = Uuid::new_v4().to_string();
        let mut priced_lines = Vec::with_capacity(input.items.len());
        let mut sale_items = Vec::with_capacity(input.items.len());

        for item in &input.items {
            let product = load_product(&mut tx, &item.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| DbError::not_found("Product", &item.product_id))?;

            // Price follows the selling UOM: an alternate UOM carries its
            // own price, the base UOM uses the base price.
            let unit_price = if item.uom == product.base_uom {
                product.base_price
            } else {
                product
                    .alternate_uoms
                    .iter()
                    .find(|alt| alt.name == item.uom)
                    .map(|alt| alt.price)
                    .ok_or_else(|| {
                        DbError::Domain(CoreError::UnknownUom {
                            product_id: product.id.clone(),
                            uom: item.uom.clone(),
                        })
                    })?
            };

            let discount =
                pricing::item_discount(unit_price, item.discount_kind, item.discount_value);
            let base_qty = product
                .to_base_uom(item.quantity, &item.uom)
                .map_err(DbError::Domain)?;

            // Cost snapshot before this line's deduction shifts the batch set
            let batches = load_active_batches(&mut tx, &product.id, &input.warehouse_id).await?;
            let avg_cost = stock::weighted_average_cost(&batches);
            let cogs = round_money(avg_cost * base_qty);

            deduct_on_conn(
                &mut tx,
                &product.id,
                &input.warehouse_id,
                base_qty,
                "POS sale",
                Some(&receipt_number),
                Some("POS"),
            )
            .await?;

            priced_lines.push(PricedLine {
                unit_price,
                quantity: item.quantity,
                discount,
            });

            sale_items.push(PosSaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: product.id.clone(),
                quantity: item.quantity,
                uom: item.uom.clone(),
                unit_price,
                discount,
                subtotal: round_money((unit_price - discount) * item.quantity),
                cost_of_goods_sold: cogs,
            });
        }

        let totals =
            pricing::total_discounts(&priced_lines, input.discount_kind, input.discount_value);
        let breakdown = pricing::vat(totals.subtotal_after_discount, vat_config);
        let total_amount = breakdown.final_total;

        let (amount_received, change_due) = match input.payment_method {
            PaymentMethod::Cash => {
                let received = input.amount_received.ok_or(ValidationError::Required {
                    field: "amount_received".to_string(),
                })?;
                if received < total_amount {
                    return Err(DbError::Domain(CoreError::Validation(
                        ValidationError::InsufficientTender {
                            received,
                            total: total_amount,
                        },
                    )));
                }
                (Some(received), Some(round_money(received - total_amount)))
            }
            _ => (None, None),
        };

        let sale = PosSale {
            id: sale_id.clone(),
            branch_id: input.branch_id.clone(),
            receipt_number: receipt_number.clone(),
            subtotal: round_money(totals.subtotal_after_discount),
            tax_amount: breakdown.vat_amount,
            discount_kind: input.discount_kind,
            discount_value: input.discount_value,
            discount_amount: round_money(totals.total_discount),
            discount_reason: input.discount_reason.clone(),
            total_amount,
            payment_method: input.payment_method,
            amount_received,
            change_due,
            sales_order_id: input.sales_order_id.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO pos_sales (
                id, branch_id, receipt_number, subtotal, tax_amount,
                discount_kind, discount_value, discount_amount, discount_reason,
                total_amount, payment_method, amount_received, change_due,
                sales_order_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.branch_id)
        .bind(&sale.receipt_number)
        .bind(sale.subtotal.to_string())
        .bind(sale.tax_amount.to_string())
        .bind(sale.discount_kind.map(|k| k.as_str()))
        .bind(sale.discount_value.map(|v| v.to_string()))
        .bind(sale.discount_amount.to_string())
        .bind(&sale.discount_reason)
        .bind(sale.total_amount.to_string())
        .bind(sale.payment_method.as_str())
        .bind(sale.amount_received.map(|v| v.to_string()))
        .bind(sale.change_due.map(|v| v.to_string()))
        .bind(&sale.sales_order_id)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        for item in &sale_items {
            sqlx::query(
                r#"
                INSERT INTO pos_sale_items (
                    id, sale_id, product_id, quantity, uom,
                    unit_price, discount, subtotal, cost_of_goods_sold
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(item.quantity.to_string())
            .bind(&item.uom)
            .bind(item.unit_price.to_string())
            .bind(item.discount.to_string())
            .bind(item.subtotal.to_string())
            .bind(item.cost_of_goods_sold.to_string())
            .execute(&mut *tx)
            .await?;
        }

        if let Some(order_id) = &input.sales_order_id {
            let result = sqlx::query(
                r#"
                UPDATE sales_orders
                SET status = 'converted', pos_sale_id = ?2
                WHERE id = ?1 AND status = 'open'
                "#,
            )
            .bind(order_id)
            .bind(&sale.id)
            .execute(&mut *tx)
            .await?;

            // Zero rows means missing, cancelled, or already converted
            if result.rows_affected() == 0 {
                return Err(DbError::not_found("Open sales order", order_id));
            }
        }

        if input.payment_method == PaymentMethod::Credit {
            let counterparty =
                input
                    .customer_name
                    .clone()
                    .ok_or(ValidationError::Required {
                        field: "customer_name".to_string(),
                    })?;
            let due_date = input
                .due_date
                .unwrap_or(today + Duration::days(DEFAULT_CREDIT_TERMS_DAYS));

            let obligation = Obligation {
                id: Uuid::new_v4().to_string(),
                kind: ObligationKind::Receivable,
                counterparty,
                branch_id: Some(input.branch_id.clone()),
                reference: Some(receipt_number.clone()),
                total_amount,
                paid_amount: Decimal::ZERO,
                balance: total_amount,
                due_date,
                status: ObligationStatus::Pending,
                created_at: Utc::now(),
            };
            insert_obligation_on_conn(&mut tx, &obligation).await?;
        }

        tx.commit().await?;

        info!(
            receipt_number = %sale.receipt_number,
            total = %sale.total_amount,
            lines = sale_items.len(),
            "Sale committed"
        );

        Ok(CompletedSale {
            sale,
            items: sale_items,
        })
    }

    /// Gets a sale by its receipt number.
    pub async fn find_by_receipt_number(&self, receipt_number: &str) -> DbResult<Option<PosSale>> {
        let row = sqlx::query(
            r#"
            SELECT id, branch_id, receipt_number, subtotal, tax_amount,
                   discount_kind, discount_value, discount_amount, discount_reason,
                   total_amount, payment_method, amount_received, change_due,
                   sales_order_id, created_at
            FROM pos_sales
            WHERE receipt_number = ?1
            "#,
        )
        .bind(receipt_number)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_sale).transpose()
    }

    /// Gets a sale's line items in insertion order.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<PosSaleItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sale_id, product_id, quantity, uom,
                   unit_price, discount, subtotal, cost_of_goods_sold
            FROM pos_sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_sale_item).collect()
    }

    /// Counts sales for a calendar day (diagnostics, Z-report groundwork).
    pub async fn count_for_day(&self, date: NaiveDate) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pos_sales WHERE receipt_number LIKE ?1")
                .bind(format!("{}-%", receipt_prefix(date)))
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

fn map_sale(row: &SqliteRow) -> DbResult<PosSale> {
    Ok(PosSale {
        id: row.try_get("id")?,
        branch_id: row.try_get("branch_id")?,
        receipt_number: row.try_get("receipt_number")?,
        subtotal: get_decimal(row, "subtotal")?,
        tax_amount: get_decimal(row, "tax_amount")?,
        discount_kind: get_opt_enum(row, "discount_kind")?,
        discount_value: get_opt_decimal(row, "discount_value")?,
        discount_amount: get_decimal(row, "discount_amount")?,
        discount_reason: row.try_get("discount_reason")?,
        total_amount: get_decimal(row, "total_amount")?,
        payment_method: get_enum(row, "payment_method")?,
        amount_received: get_opt_decimal(row, "amount_received")?,
        change_due: get_opt_decimal(row, "change_due")?,
        sales_order_id: row.try_get("sales_order_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_sale_item(row: &SqliteRow) -> DbResult<PosSaleItem> {
    Ok(PosSaleItem {
        id: row.try_get("id")?,
        sale_id: row.try_get("sale_id")?,
        product_id: row.try_get("product_id")?,
        quantity: get_decimal(row, "quantity")?,
        uom: row.try_get("uom")?,
        unit_price: get_decimal(row, "unit_price")?,
        discount: get_decimal(row, "discount")?,
        subtotal: get_decimal(row, "subtotal")?,
        cost_of_goods_sold: get_decimal(row, "cost_of_goods_sold")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::inventory::ReceiveStock;
    use crate::repository::testutil::{d, seed_product, seed_warehouse, test_db};
    use crate::pool::Database;
    use crate::DbError;
    use bodega_core::receipt::receipt_prefix;

    fn date(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    async fn seed_stock(db: &Database, product_id: &str, wh: &str, batch: &str, qty: &str, cost: &str) {
        db.inventory()
            .add_batch(&ReceiveStock {
                product_id: product_id.to_string(),
                warehouse_id: wh.to_string(),
                batch_number: batch.to_string(),
                quantity: d(qty),
                unit_cost: d(cost),
                expiry_date: Some(date(2027, 1, 1)),
                received_date: Some(date(2026, 1, 1)),
            })
            .await
            .unwrap();
    }

    fn cash_sale(wh: &str, items: Vec<SaleItemInput>, received: &str) -> SaleInput {
        SaleInput {
            branch_id: "branch-1".to_string(),
            warehouse_id: wh.to_string(),
            items,
            discount_kind: None,
            discount_value: None,
            discount_reason: None,
            payment_method: PaymentMethod::Cash,
            amount_received: Some(d(received)),
            receipt_number: None,
            customer_name: None,
            due_date: None,
            sales_order_id: None,
        }
    }

    fn line(product_id: &str, qty: &str, uom: &str) -> SaleItemInput {
        SaleItemInput {
            product_id: product_id.to_string(),
            quantity: d(qty),
            uom: uom.to_string(),
            discount_kind: None,
            discount_value: None,
        }
    }

    fn vat_exclusive_12() -> VatConfig {
        VatConfig {
            enabled: true,
            rate: d("12"),
            tax_inclusive: false,
        }
    }

    #[tokio::test]
    async fn test_cash_sale_totals_and_stock() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        // base price 10.00/bottle from the seed helper
        let product = seed_product(&db, "COLA", None).await;
        seed_stock(&db, &product.id, &wh, "B-1", "100", "6.00").await;

        let input = cash_sale(&wh, vec![line(&product.id, "5", "bottle")], "100.00");
        let completed = db
            .sales()
            .process_sale(&input, &vat_exclusive_12())
            .await
            .unwrap();

        // 5 × 10.00 = 50.00, VAT 6.00, total 56.00, change 44.00
        assert_eq!(completed.sale.subtotal, d("50.00"));
        assert_eq!(completed.sale.tax_amount, d("6.00"));
        assert_eq!(completed.sale.total_amount, d("56.00"));
        assert_eq!(completed.sale.change_due, Some(d("44.00")));

        // COGS = 6.00 avg cost × 5 base units
        assert_eq!(completed.items[0].cost_of_goods_sold, d("30.00"));

        let remaining = db.inventory().available(&product.id, &wh).await.unwrap();
        assert_eq!(remaining, d("95"));

        let prefix = receipt_prefix(Utc::now().date_naive());
        assert_eq!(completed.sale.receipt_number, format!("{prefix}-0001"));
    }

    #[tokio::test]
    async fn test_receipt_numbers_are_sequential() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "COLA", None).await;
        seed_stock(&db, &product.id, &wh, "B-1", "100", "6.00").await;

        let input = cash_sale(&wh, vec![line(&product.id, "1", "bottle")], "50.00");
        let first = db.sales().process_sale(&input, &VatConfig::disabled()).await.unwrap();
        let second = db.sales().process_sale(&input, &VatConfig::disabled()).await.unwrap();

        let prefix = receipt_prefix(Utc::now().date_naive());
        assert_eq!(first.sale.receipt_number, format!("{prefix}-0001"));
        assert_eq!(second.sale.receipt_number, format!("{prefix}-0002"));
    }

    #[tokio::test]
    async fn test_duplicate_explicit_receipt_rejected() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "COLA", None).await;
        seed_stock(&db, &product.id, &wh, "B-1", "100", "6.00").await;

        let mut input = cash_sale(&wh, vec![line(&product.id, "1", "bottle")], "50.00");
        input.receipt_number = Some("RCP-20260101-0007".to_string());
        db.sales().process_sale(&input, &VatConfig::disabled()).await.unwrap();

        let err = db
            .sales()
            .process_sale(&input, &VatConfig::disabled())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::DuplicateReceiptNumber(_))
        ));
    }

    #[tokio::test]
    async fn test_multi_line_sale_rolls_back_atomically() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let plenty = seed_product(&db, "PLENTY", None).await;
        let scarce = seed_product(&db, "SCARCE", None).await;
        seed_stock(&db, &plenty.id, &wh, "B-1", "100", "5.00").await;
        seed_stock(&db, &scarce.id, &wh, "B-2", "2", "5.00").await;

        // Second line fails on stock; first line's deduction must vanish
        let input = cash_sale(
            &wh,
            vec![line(&plenty.id, "10", "bottle"), line(&scarce.id, "5", "bottle")],
            "500.00",
        );
        let err = db
            .sales()
            .process_sale(&input, &VatConfig::disabled())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { .. })
        ));

        assert_eq!(db.inventory().available(&plenty.id, &wh).await.unwrap(), d("100"));
        assert_eq!(db.inventory().available(&scarce.id, &wh).await.unwrap(), d("2"));
        assert_eq!(
            db.sales().count_for_day(Utc::now().date_naive()).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_insufficient_tender_rejected() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "COLA", None).await;
        seed_stock(&db, &product.id, &wh, "B-1", "100", "6.00").await;

        // 5 × 10.00 = 50.00 total, only 40 tendered
        let input = cash_sale(&wh, vec![line(&product.id, "5", "bottle")], "40.00");
        let err = db
            .sales()
            .process_sale(&input, &VatConfig::disabled())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(
                ValidationError::InsufficientTender { .. }
            ))
        ));

        // Nothing committed
        assert_eq!(db.inventory().available(&product.id, &wh).await.unwrap(), d("100"));
    }

    #[tokio::test]
    async fn test_alternate_uom_price_and_deduction() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        // case = 24 bottles @ 216.00/case from the seed helper
        let product = seed_product(&db, "COLA", Some(24)).await;
        seed_stock(&db, &product.id, &wh, "B-1", "100", "6.00").await;

        let input = cash_sale(&wh, vec![line(&product.id, "2", "case")], "500.00");
        let completed = db
            .sales()
            .process_sale(&input, &VatConfig::disabled())
            .await
            .unwrap();

        // 2 cases × 216.00
        assert_eq!(completed.sale.total_amount, d("432.00"));
        // 48 base units deducted, COGS = 6.00 × 48
        assert_eq!(completed.items[0].cost_of_goods_sold, d("288.00"));
        assert_eq!(db.inventory().available(&product.id, &wh).await.unwrap(), d("52"));
    }

    #[tokio::test]
    async fn test_unknown_uom_fails_sale() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "COLA", None).await;
        seed_stock(&db, &product.id, &wh, "B-1", "100", "6.00").await;

        let input = cash_sale(&wh, vec![line(&product.id, "1", "pallet")], "50.00");
        let err = db
            .sales()
            .process_sale(&input, &VatConfig::disabled())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::UnknownUom { .. })));
    }

    #[tokio::test]
    async fn test_credit_sale_creates_receivable() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "COLA", None).await;
        seed_stock(&db, &product.id, &wh, "B-1", "100", "6.00").await;

        let mut input = cash_sale(&wh, vec![line(&product.id, "10", "bottle")], "0");
        input.payment_method = PaymentMethod::Credit;
        input.amount_received = None;
        input.customer_name = Some("Acme Retail".to_string());

        let completed = db
            .sales()
            .process_sale(&input, &VatConfig::disabled())
            .await
            .unwrap();
        assert_eq!(completed.sale.total_amount, d("100.00"));

        let open = db
            .obligations()
            .list_open(ObligationKind::Receivable)
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].counterparty, "Acme Retail");
        assert_eq!(open[0].total_amount, d("100.00"));
        assert_eq!(open[0].balance, d("100.00"));
        assert_eq!(open[0].status, ObligationStatus::Pending);
        assert_eq!(
            open[0].reference.as_deref(),
            Some(completed.sale.receipt_number.as_str())
        );
    }

    #[tokio::test]
    async fn test_credit_sale_requires_customer_name() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "COLA", None).await;
        seed_stock(&db, &product.id, &wh, "B-1", "100", "6.00").await;

        let mut input = cash_sale(&wh, vec![line(&product.id, "1", "bottle")], "0");
        input.payment_method = PaymentMethod::Credit;
        input.amount_received = None;

        let err = db
            .sales()
            .process_sale(&input, &VatConfig::disabled())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[tokio::test]
    async fn test_sales_order_conversion() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "COLA", None).await;
        seed_stock(&db, &product.id, &wh, "B-1", "100", "6.00").await;

        sqlx::query(
            "INSERT INTO sales_orders (id, customer_name, status, created_at) \
             VALUES ('so-1', 'Acme Retail', 'open', ?1)",
        )
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();

        let mut input = cash_sale(&wh, vec![line(&product.id, "1", "bottle")], "50.00");
        input.sales_order_id = Some("so-1".to_string());
        let completed = db
            .sales()
            .process_sale(&input, &VatConfig::disabled())
            .await
            .unwrap();

        let status: String = sqlx::query_scalar("SELECT status FROM sales_orders WHERE id = 'so-1'")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(status, "converted");

        let linked: Option<String> =
            sqlx::query_scalar("SELECT pos_sale_id FROM sales_orders WHERE id = 'so-1'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(linked.as_deref(), Some(completed.sale.id.as_str()));

        // Converting the same order again fails and commits nothing
        let err = db
            .sales()
            .process_sale(&input, &VatConfig::disabled())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_discounts_flow_into_totals() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "COLA", None).await;
        seed_stock(&db, &product.id, &wh, "B-1", "100", "6.00").await;

        // 10 bottles at 10.00 with 10% item discount → 90.00,
        // then 5.00 fixed transaction discount → 85.00
        let mut item = line(&product.id, "10", "bottle");
        item.discount_kind = Some(DiscountKind::Percentage);
        item.discount_value = Some(d("10"));

        let mut input = cash_sale(&wh, vec![item], "100.00");
        input.discount_kind = Some(DiscountKind::Fixed);
        input.discount_value = Some(d("5"));

        let completed = db
            .sales()
            .process_sale(&input, &VatConfig::disabled())
            .await
            .unwrap();
        assert_eq!(completed.sale.subtotal, d("85.00"));
        assert_eq!(completed.sale.discount_amount, d("15.00"));
        assert_eq!(completed.sale.total_amount, d("85.00"));
        assert_eq!(completed.items[0].discount, d("1.00"));
    }

    #[tokio::test]
    async fn test_find_by_receipt_and_items_round_trip() {
        let db = test_db().await;
        let wh = seed_warehouse(&db, "Main", None).await;
        let product = seed_product(&db, "COLA", None).await;
        seed_stock(&db, &product.id, &wh, "B-1", "100", "6.00").await;

        let input = cash_sale(&wh, vec![line(&product.id, "3", "bottle")], "50.00");
        let completed = db
            .sales()
            .process_sale(&input, &vat_exclusive_12())
            .await
            .unwrap();

        let loaded = db
            .sales()
            .find_by_receipt_number(&completed.sale.receipt_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.total_amount, completed.sale.total_amount);
        assert_eq!(loaded.payment_method, PaymentMethod::Cash);

        let items = db.sales().items(&loaded.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, d("3"));
        assert_eq!(items[0].uom, "bottle");
    }
}
