//! # Stock Module
//!
//! Pure inventory arithmetic: weighted-average costing, the FIFO-by-expiry
//! deduction planner, and the warehouse capacity check.
//!
//! ## Deduction Design
//! ```text
//! load batches ──► plan_deduction (THIS MODULE) ──► apply draws in one tx
//!                  verify sufficiency FIRST,
//!                  then greedily draw soonest-to-expire
//! ```
//! The planner never mutates anything. The persistence layer applies the
//! returned draws inside a single transaction, so a failure can never leave
//! a partial deduction behind: insufficiency is detected before the first
//! batch is touched.
//!
//! This is the one reusable FIFO-by-expiry ordering policy; every deduction
//! path goes through it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::InventoryBatch;

// =============================================================================
// Deduction Plan
// =============================================================================

/// One batch's share of a planned deduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDraw {
    pub batch_id: String,
    /// Quantity to remove from this batch, in base UOM.
    pub quantity: Decimal,
    /// Remaining quantity after the draw.
    pub remaining: Decimal,
    /// True when the draw brings the batch to exactly zero; the batch then
    /// transitions to `depleted`.
    pub depletes: bool,
}

// =============================================================================
// Weighted Average Cost
// =============================================================================

/// Quantity-weighted mean unit cost across consumable batches.
///
/// `Σ(quantity × unit_cost) / Σ(quantity)` over active batches with
/// quantity > 0. Returns 0 when no active stock exists - the caller must
/// handle this; a sale against zero stock should fail upstream on the
/// deduction, not silently book zero cost.
///
/// Derived, never stored: batch composition changes on every deduction and
/// addition, so the value is recomputed from the batch set each time.
pub fn weighted_average_cost(batches: &[InventoryBatch]) -> Decimal {
    let mut total_qty = Decimal::ZERO;
    let mut total_value = Decimal::ZERO;

    for batch in batches.iter().filter(|b| b.is_consumable()) {
        total_qty += batch.quantity;
        total_value += batch.quantity * batch.unit_cost;
    }

    if total_qty.is_zero() {
        return Decimal::ZERO;
    }

    total_value / total_qty
}

/// Total consumable quantity across a batch set, in base UOM.
pub fn available_quantity(batches: &[InventoryBatch]) -> Decimal {
    batches
        .iter()
        .filter(|b| b.is_consumable())
        .map(|b| b.quantity)
        .sum()
}

// =============================================================================
// FIFO-by-Expiry Deduction Planning
// =============================================================================

/// Plans a stock deduction across a batch set.
///
/// Consumption order: ascending `expiry_date` (first-expired-first-out);
/// ties broken by received date, then batch id for determinism. Within each
/// batch the draw is `min(remaining requested, batch quantity)`.
///
/// ## Errors
/// `CoreError::InsufficientStock` when total consumable stock is less than
/// `requested`. Sufficiency is verified across ALL eligible batches before
/// any draw is planned, so the caller never applies a partial deduction.
///
/// ## Edge Cases
/// - `requested == 0` yields an empty plan (a no-op, not an error)
/// - Expired and depleted batches never participate
///
/// ## Example
/// ```text
/// B1 (qty 50, expires in 10 days), B2 (qty 50, expires in 60 days)
/// plan_deduction(.., 60) ──► draw 50 from B1 (depletes), 10 from B2
/// ```
pub fn plan_deduction(batches: &[InventoryBatch], requested: Decimal) -> CoreResult<Vec<BatchDraw>> {
    if requested < Decimal::ZERO {
        return Err(CoreError::Validation(
            crate::error::ValidationError::MustNotBeNegative {
                field: "deduction quantity".to_string(),
            },
        ));
    }

    if requested.is_zero() {
        return Ok(Vec::new());
    }

    let available = available_quantity(batches);
    if available < requested {
        return Err(CoreError::InsufficientStock {
            requested,
            available,
        });
    }

    let mut eligible: Vec<&InventoryBatch> =
        batches.iter().filter(|b| b.is_consumable()).collect();
    eligible.sort_by(|a, b| {
        a.expiry_date
            .cmp(&b.expiry_date)
            .then(a.received_date.cmp(&b.received_date))
            .then(a.id.cmp(&b.id))
    });

    let mut remaining = requested;
    let mut draws = Vec::new();

    for batch in eligible {
        if remaining.is_zero() {
            break;
        }

        let draw_qty = remaining.min(batch.quantity);
        let left = batch.quantity - draw_qty;
        draws.push(BatchDraw {
            batch_id: batch.id.clone(),
            quantity: draw_qty,
            remaining: left,
            depletes: left.is_zero(),
        });
        remaining -= draw_qty;
    }

    Ok(draws)
}

// =============================================================================
// Warehouse Capacity
// =============================================================================

/// Checks that adding `incoming` base units keeps the warehouse within its
/// configured maximum capacity.
///
/// `current_total` is the warehouse's total current stock summed in base
/// UOM across all products. A `None` capacity means unlimited.
///
/// ## Errors
/// `CoreError::CapacityExceeded` with the excess amount.
pub fn check_capacity(
    current_total: Decimal,
    incoming: Decimal,
    max_capacity: Option<Decimal>,
) -> CoreResult<()> {
    let max = match max_capacity {
        Some(max) => max,
        None => return Ok(()),
    };

    let projected = current_total + incoming;
    if projected > max {
        return Err(CoreError::CapacityExceeded {
            excess: projected - max,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
