//! # Domain Types
//!
//! Core domain types used throughout Bodega.
//!
//! ## Ownership
//! ```text
//! Product ──owns──► AlternateUom (unique names, fixed conversion factors)
//! (Product, Warehouse) ──owns──► InventoryBatch (cost + expiry per lot)
//! PosSale ──owns──► PosSaleItem (frozen price, per-line COGS)
//! Obligation (AR/AP) ──owns──► ObligationPayment
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (batch_number, receipt_number, ...) - human-readable
//!
//! All statuses serialize snake_case and persist as TEXT via
//! `as_str`/`FromStr`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{CoreError, ValidationError};

// =============================================================================
// Units of Measure
// =============================================================================

/// An alternate unit of measure for a product.
///
/// Each alternate carries a fixed conversion factor to the base UOM and its
/// own selling price. A "case" of 24 bottles has `factor = 24`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternateUom {
    /// UOM name, unique per product and never equal to the base UOM name.
    pub name: String,
    /// Multiplier to convert one of this UOM into base units.
    pub factor: Decimal,
    /// Selling price for one of this UOM.
    pub price: Decimal,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown to operators and on receipts.
    pub name: String,

    /// Base unit of measure (e.g., "bottle").
    pub base_uom: String,

    /// Selling price for one base unit.
    pub base_price: Decimal,

    /// Reorder threshold in base UOM for low-stock reporting.
    pub min_stock_level: Decimal,

    /// Shelf life in days; used to default expiry dates on receiving.
    pub shelf_life_days: Option<i64>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// Alternate UOMs with their conversion factors and prices.
    pub alternate_uoms: Vec<AlternateUom>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Converts a quantity in the given UOM to base units.
    ///
    /// Identity when `uom` is the base UOM; otherwise multiplies by the
    /// matching alternate's conversion factor.
    ///
    /// ## Errors
    /// `CoreError::UnknownUom` when the UOM matches neither the base UOM
    /// nor any alternate.
    ///
    /// ## Example
    /// ```rust
    /// # use bodega_core::types::{Product, AlternateUom};
    /// # use rust_decimal::Decimal;
    /// # let mut product = Product::sample();
    /// product.base_uom = "bottle".to_string();
    /// product.alternate_uoms = vec![AlternateUom {
    ///     name: "case".to_string(),
    ///     factor: Decimal::new(24, 0),
    ///     price: Decimal::new(21600, 2),
    /// }];
    /// let base = product.to_base_uom(Decimal::new(2, 0), "case").unwrap();
    /// assert_eq!(base, Decimal::new(48, 0));
    /// ```
    pub fn to_base_uom(&self, quantity: Decimal, uom: &str) -> Result<Decimal, CoreError> {
        if uom == self.base_uom {
            return Ok(quantity);
        }

        match self.alternate_uoms.iter().find(|alt| alt.name == uom) {
            Some(alt) => Ok(quantity * alt.factor),
            None => Err(CoreError::UnknownUom {
                product_id: self.id.clone(),
                uom: uom.to_string(),
            }),
        }
    }

    /// Validates alternate UOM names: unique, and never equal to the base
    /// UOM name.
    pub fn validate_uoms(&self) -> Result<(), ValidationError> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.alternate_uoms.len());

        for alt in &self.alternate_uoms {
            if alt.name == self.base_uom {
                return Err(ValidationError::Duplicate {
                    field: "alternate UOM".to_string(),
                    value: alt.name.clone(),
                });
            }
            if seen.contains(&alt.name.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: "alternate UOM".to_string(),
                    value: alt.name.clone(),
                });
            }
            if alt.factor <= Decimal::ZERO {
                return Err(ValidationError::MustBePositive {
                    field: format!("conversion factor for '{}'", alt.name),
                });
            }
            seen.push(&alt.name);
        }

        Ok(())
    }

    /// Builds a minimal valid product for doctests and unit tests.
    pub fn sample() -> Self {
        let now = Utc::now();
        Product {
            id: "11111111-1111-1111-1111-111111111111".to_string(),
            sku: "SAMPLE-1".to_string(),
            name: "Sample Product".to_string(),
            base_uom: "piece".to_string(),
            base_price: Decimal::new(1000, 2),
            min_stock_level: Decimal::ZERO,
            shelf_life_days: None,
            is_active: true,
            alternate_uoms: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Inventory Batch
// =============================================================================

/// Lifecycle status of an inventory batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Holds sellable stock.
    Active,
    /// Past its expiry date; excluded from costing and deduction.
    Expired,
    /// Quantity reached exactly zero.
    Depleted,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Active => "active",
            BatchStatus::Expired => "expired",
            BatchStatus::Depleted => "depleted",
        }
    }
}

impl FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BatchStatus::Active),
            "expired" => Ok(BatchStatus::Expired),
            "depleted" => Ok(BatchStatus::Depleted),
            other => Err(format!("unknown batch status: {other}")),
        }
    }
}

/// A discrete received lot of a product at a warehouse.
///
/// Multiple batches of the same product/warehouse coexist with different
/// costs and expiry dates - this is what makes weighted-average costing and
/// FIFO-by-expiry deduction necessary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryBatch {
    pub id: String,
    pub product_id: String,
    pub warehouse_id: String,
    /// Business identifier, unique per batch.
    pub batch_number: String,
    /// Quantity on hand in base UOM. Never negative.
    pub quantity: Decimal,
    /// Unit cost at receipt, in base UOM.
    pub unit_cost: Decimal,
    pub expiry_date: NaiveDate,
    pub received_date: NaiveDate,
    pub status: BatchStatus,
}

impl InventoryBatch {
    /// Whether this batch participates in costing and deduction.
    #[inline]
    pub fn is_consumable(&self) -> bool {
        self.status == BatchStatus::Active && self.quantity > Decimal::ZERO
    }
}

// =============================================================================
// Warehouse
// =============================================================================

/// A physical storage location with an optional capacity ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: String,
    pub name: String,
    pub branch_id: Option<String>,
    /// Maximum total stock across all products, in base UOM.
    /// `None` means unlimited.
    pub max_capacity: Option<Decimal>,
}

// =============================================================================
// Discounts
// =============================================================================

/// How a discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Value is a percentage of the discounted amount.
    Percentage,
    /// Value is a flat amount, capped at the amount it discounts.
    Fixed,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Fixed => "fixed",
        }
    }
}

impl FromStr for DiscountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountKind::Percentage),
            "fixed" => Ok(DiscountKind::Fixed),
            other => Err(format!("unknown discount kind: {other}")),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash; requires tendered amount and change.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// On-account sale; creates an accounts-receivable entry.
    Credit,
    /// Bank transfer (obligation payments).
    BankTransfer,
    /// Cheque (obligation payments).
    Cheque,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Credit => "credit",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cheque => "cheque",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "credit" => Ok(PaymentMethod::Credit),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "cheque" => Ok(PaymentMethod::Cheque),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

// =============================================================================
// POS Sale
// =============================================================================

/// A completed POS transaction. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosSale {
    pub id: String,
    pub branch_id: String,
    /// Unique, format `RCP-YYYYMMDD-NNNN`, sequential per day.
    pub receipt_number: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_kind: Option<DiscountKind>,
    pub discount_value: Option<Decimal>,
    pub discount_amount: Decimal,
    pub discount_reason: Option<String>,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    /// Cash only: amount the customer handed over.
    pub amount_received: Option<Decimal>,
    /// Cash only: change returned.
    pub change_due: Option<Decimal>,
    /// Set when this sale was converted from a sales order.
    pub sales_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A line item in a POS sale.
/// Price and cost are frozen at time of sale (snapshot pattern).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosSaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Quantity in the selling UOM.
    pub quantity: Decimal,
    /// UOM the quantity was sold in (base or alternate).
    pub uom: String,
    /// Unit price at time of sale (frozen).
    pub unit_price: Decimal,
    /// Per-unit discount amount.
    pub discount: Decimal,
    /// (unit_price - discount) × quantity.
    pub subtotal: Decimal,
    /// Weighted-average cost × base-UOM quantity, at time of sale.
    pub cost_of_goods_sold: Decimal,
}

// =============================================================================
// Sales Order (conversion target)
// =============================================================================

/// Status of a sales order with respect to POS conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesOrderStatus {
    Open,
    Converted,
    Cancelled,
}

impl SalesOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesOrderStatus::Open => "open",
            SalesOrderStatus::Converted => "converted",
            SalesOrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for SalesOrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(SalesOrderStatus::Open),
            "converted" => Ok(SalesOrderStatus::Converted),
            "cancelled" => Ok(SalesOrderStatus::Cancelled),
            other => Err(format!("unknown sales order status: {other}")),
        }
    }
}

// =============================================================================
// Accounts Receivable / Payable
// =============================================================================

/// Which side of the ledger an obligation sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationKind {
    /// Money owed to the business (credit sales).
    Receivable,
    /// Money owed by the business (purchase orders).
    Payable,
}

impl ObligationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObligationKind::Receivable => "receivable",
            ObligationKind::Payable => "payable",
        }
    }
}

impl FromStr for ObligationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "receivable" => Ok(ObligationKind::Receivable),
            "payable" => Ok(ObligationKind::Payable),
            other => Err(format!("unknown obligation kind: {other}")),
        }
    }
}

/// Settlement status of an obligation.
///
/// `Overdue` can override `Pending`/`Partial` when the due date has passed
/// with a balance remaining, but never a fully paid record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

impl ObligationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObligationStatus::Pending => "pending",
            ObligationStatus::Partial => "partial",
            ObligationStatus::Paid => "paid",
            ObligationStatus::Overdue => "overdue",
        }
    }
}

impl FromStr for ObligationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ObligationStatus::Pending),
            "partial" => Ok(ObligationStatus::Partial),
            "paid" => Ok(ObligationStatus::Paid),
            "overdue" => Ok(ObligationStatus::Overdue),
            other => Err(format!("unknown obligation status: {other}")),
        }
    }
}

/// An AR or AP obligation with a running balance.
///
/// Invariant: `balance == total_amount - paid_amount` and `balance >= 0`
/// after every payment. Balance and status are recomputed transactionally
/// on each payment, never stored independently of the payment history
/// without reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obligation {
    pub id: String,
    pub kind: ObligationKind,
    /// Customer (AR) or supplier (AP) name.
    pub counterparty: String,
    pub branch_id: Option<String>,
    /// Source document: receipt number, PO number.
    pub reference: Option<String>,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
    pub due_date: NaiveDate,
    pub status: ObligationStatus,
    pub created_at: DateTime<Utc>,
}

/// A payment applied against an obligation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObligationPayment {
    pub id: String,
    pub obligation_id: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference_number: Option<String>,
    pub payment_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Configuration Types
// =============================================================================

/// VAT configuration, sourced from company settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VatConfig {
    pub enabled: bool,
    /// Rate as a percentage (12 = 12%).
    pub rate: Decimal,
    /// When true, quoted prices already contain VAT.
    pub tax_inclusive: bool,
}

impl VatConfig {
    /// VAT disabled; calculator passes amounts through unchanged.
    pub fn disabled() -> Self {
        VatConfig {
            enabled: false,
            rate: Decimal::ZERO,
            tax_inclusive: false,
        }
    }
}

/// Discount policy, sourced from company settings.
///
/// This feeds the advisory `validate_discount` gate; the caller decides
/// what "requires approval" means operationally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountPolicy {
    /// Hard ceiling on discount percentage.
    pub max_discount_pct: Decimal,
    /// Whether discounts above the threshold need a supervisor.
    pub require_approval: bool,
    /// Percentage above which approval is flagged.
    pub approval_threshold: Decimal,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn product_with_case_uom() -> Product {
        let mut product = Product::sample();
        product.base_uom = "bottle".to_string();
        product.alternate_uoms = vec![AlternateUom {
            name: "case".to_string(),
            factor: Decimal::new(24, 0),
            price: Decimal::new(21600, 2),
        }];
        product
    }

    #[test]
    fn test_to_base_uom_identity() {
        let product = product_with_case_uom();
        let qty = Decimal::new(7, 0);
        assert_eq!(product.to_base_uom(qty, "bottle").unwrap(), qty);
    }

    #[test]
    fn test_to_base_uom_alternate() {
        let product = product_with_case_uom();
        let base = product.to_base_uom(Decimal::new(3, 0), "case").unwrap();
        assert_eq!(base, Decimal::new(72, 0));
    }

    #[test]
    fn test_to_base_uom_round_trip() {
        // Conversion factor is a pure multiplier: dividing recovers the input
        let product = product_with_case_uom();
        let original = Decimal::new(5, 1); // 0.5 cases
        let base = product.to_base_uom(original, "case").unwrap();
        assert_eq!(base / Decimal::new(24, 0), original);
    }

    #[test]
    fn test_to_base_uom_unknown() {
        let product = product_with_case_uom();
        let err = product.to_base_uom(Decimal::ONE, "pallet").unwrap_err();
        assert!(matches!(err, CoreError::UnknownUom { .. }));
    }

    #[test]
    fn test_validate_uoms_rejects_base_name() {
        let mut product = product_with_case_uom();
        product.alternate_uoms.push(AlternateUom {
            name: "bottle".to_string(),
            factor: Decimal::ONE,
            price: Decimal::new(900, 2),
        });
        assert!(product.validate_uoms().is_err());
    }

    #[test]
    fn test_validate_uoms_rejects_duplicate_name() {
        let mut product = product_with_case_uom();
        product.alternate_uoms.push(AlternateUom {
            name: "case".to_string(),
            factor: Decimal::new(12, 0),
            price: Decimal::new(11000, 2),
        });
        assert!(product.validate_uoms().is_err());
    }

    #[test]
    fn test_batch_consumable() {
        let batch = InventoryBatch {
            id: "b1".to_string(),
            product_id: "p1".to_string(),
            warehouse_id: "w1".to_string(),
            batch_number: "BN-1".to_string(),
            quantity: Decimal::new(10, 0),
            unit_cost: Decimal::new(500, 2),
            expiry_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            received_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            status: BatchStatus::Active,
        };
        assert!(batch.is_consumable());

        let mut depleted = batch.clone();
        depleted.quantity = Decimal::ZERO;
        depleted.status = BatchStatus::Depleted;
        assert!(!depleted.is_consumable());

        let mut expired = batch;
        expired.status = BatchStatus::Expired;
        assert!(!expired.is_consumable());
    }

    #[test]
    fn test_status_round_trips() {
        for status in [
            BatchStatus::Active,
            BatchStatus::Expired,
            BatchStatus::Depleted,
        ] {
            assert_eq!(status.as_str().parse::<BatchStatus>().unwrap(), status);
        }
        for status in [
            ObligationStatus::Pending,
            ObligationStatus::Partial,
            ObligationStatus::Paid,
            ObligationStatus::Overdue,
        ] {
            assert_eq!(status.as_str().parse::<ObligationStatus>().unwrap(), status);
        }
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::Card,
            PaymentMethod::Credit,
            PaymentMethod::BankTransfer,
            PaymentMethod::Cheque,
        ] {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
        }
    }
}
