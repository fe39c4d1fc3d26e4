//! # Pricing Module
//!
//! Pure, stateless discount and VAT calculation.
//!
//! ## Calculation Pipeline
//! ```text
//! line items ──► item discounts ──► transaction discount ──► VAT ──► total
//!                (per unit)          (on post-item subtotal)
//! ```
//!
//! ## Rules Reproduced Exactly
//! - A fixed discount larger than the price silently caps at the price
//!   (no error)
//! - A zero or missing discount value/kind is a no-op, not an error
//! - A percentage discount above 100% is NOT blocked by these functions;
//!   only [`validate_discount`] enforces a ceiling, and only if called
//! - Results are rounded to 2 decimal places at the point of output only

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{percent_of, round_money};
use crate::types::{DiscountKind, DiscountPolicy, VatConfig};

// =============================================================================
// Inputs / Outputs
// =============================================================================

/// Pricing view of one cart line, as the calculator needs it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PricedLine {
    pub unit_price: Decimal,
    pub quantity: Decimal,
    /// Per-unit discount amount already resolved for this line.
    pub discount: Decimal,
}

/// Aggregate discount breakdown for a whole cart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountTotals {
    /// Σ line.discount × line.quantity
    pub item_discounts_total: Decimal,
    /// Transaction-level discount, computed on the post-item-discount
    /// subtotal.
    pub transaction_discount: Decimal,
    pub total_discount: Decimal,
    /// Clamped to >= 0.
    pub subtotal_after_discount: Decimal,
}

/// VAT amount and final total for a discounted subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VatBreakdown {
    pub vat_amount: Decimal,
    pub final_total: Decimal,
}

/// Result of the advisory discount policy gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountCheck {
    pub is_valid: bool,
    pub requires_approval: bool,
    pub error: Option<String>,
}

// =============================================================================
// Discount Calculation
// =============================================================================

/// Computes the discount amount for a single item.
///
/// Returns 0 when kind/value is missing or value <= 0.
/// Percentage: `price × value/100`. Fixed: `min(value, price)` - a fixed
/// discount can never exceed the price it discounts.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use bodega_core::pricing::item_discount;
/// use bodega_core::types::DiscountKind;
///
/// let price = Decimal::new(10000, 2); // 100.00
/// let capped = item_discount(
///     price,
///     Some(DiscountKind::Fixed),
///     Some(Decimal::new(100000, 2)), // 1000.00
/// );
/// assert_eq!(capped, price); // capped at the price, not an error
/// ```
pub fn item_discount(
    original_price: Decimal,
    kind: Option<DiscountKind>,
    value: Option<Decimal>,
) -> Decimal {
    let (kind, value) = match (kind, value) {
        (Some(kind), Some(value)) if value > Decimal::ZERO => (kind, value),
        _ => return Decimal::ZERO,
    };

    match kind {
        DiscountKind::Percentage => percent_of(original_price, value),
        DiscountKind::Fixed => value.min(original_price),
    }
}

/// Computes the transaction-level discount on a whole-cart subtotal.
///
/// Same rule as [`item_discount`], applied to the subtotal.
pub fn transaction_discount(
    subtotal: Decimal,
    kind: Option<DiscountKind>,
    value: Option<Decimal>,
) -> Decimal {
    item_discount(subtotal, kind, value)
}

/// Aggregates item-level and transaction-level discounts for a cart.
///
/// The transaction discount is computed on the post-item-discount subtotal,
/// and `subtotal_after_discount` is clamped to >= 0.
pub fn total_discounts(
    items: &[PricedLine],
    tx_kind: Option<DiscountKind>,
    tx_value: Option<Decimal>,
) -> DiscountTotals {
    let gross: Decimal = items
        .iter()
        .map(|line| line.unit_price * line.quantity)
        .sum();

    let item_discounts_total: Decimal = items
        .iter()
        .map(|line| line.discount * line.quantity)
        .sum();

    let after_items = gross - item_discounts_total;
    let tx_discount = transaction_discount(after_items, tx_kind, tx_value);

    let subtotal_after_discount = (after_items - tx_discount).max(Decimal::ZERO);

    DiscountTotals {
        item_discounts_total,
        transaction_discount: tx_discount,
        total_discount: item_discounts_total + tx_discount,
        subtotal_after_discount,
    }
}

// =============================================================================
// VAT Calculation
// =============================================================================

/// Computes VAT and the final total for a discounted subtotal.
///
/// - Disabled: VAT = 0, final = input.
/// - Tax-inclusive: the quoted price already contains VAT.
///   `vat = subtotal/(1+rate) × rate`, final unchanged.
/// - Tax-exclusive: `vat = subtotal × rate`, final = subtotal + vat.
///
/// Internal math runs at full precision; both outputs are rounded to two
/// places at return.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use bodega_core::pricing::vat;
/// use bodega_core::types::VatConfig;
///
/// let config = VatConfig {
///     enabled: true,
///     rate: Decimal::new(12, 0),
///     tax_inclusive: true,
/// };
/// let breakdown = vat(Decimal::new(11200, 2), &config);
/// assert_eq!(breakdown.vat_amount, Decimal::new(1200, 2));   // 12.00
/// assert_eq!(breakdown.final_total, Decimal::new(11200, 2)); // unchanged
/// ```
pub fn vat(subtotal_after_discount: Decimal, config: &VatConfig) -> VatBreakdown {
    if !config.enabled {
        return VatBreakdown {
            vat_amount: Decimal::ZERO,
            final_total: round_money(subtotal_after_discount),
        };
    }

    let rate = config.rate / Decimal::ONE_HUNDRED;

    if config.tax_inclusive {
        let vat_amount = subtotal_after_discount / (Decimal::ONE + rate) * rate;
        VatBreakdown {
            vat_amount: round_money(vat_amount),
            final_total: round_money(subtotal_after_discount),
        }
    } else {
        let vat_amount = subtotal_after_discount * rate;
        VatBreakdown {
            vat_amount: round_money(vat_amount),
            final_total: round_money(subtotal_after_discount + vat_amount),
        }
    }
}

// =============================================================================
// Discount Policy Gate
// =============================================================================

/// Validates a discount percentage against company policy.
///
/// This is a policy gate, not an enforcement mechanism - the caller decides
/// what `requires_approval` means operationally. Rejects negative
/// percentages and percentages over the configured maximum; flags approval
/// when the percentage exceeds the threshold and the policy mandates it.
pub fn validate_discount(discount_pct: Decimal, policy: &DiscountPolicy) -> DiscountCheck {
    if discount_pct < Decimal::ZERO {
        return DiscountCheck {
            is_valid: false,
            requires_approval: false,
            error: Some("Discount percentage cannot be negative".to_string()),
        };
    }

    if discount_pct > policy.max_discount_pct {
        return DiscountCheck {
            is_valid: false,
            requires_approval: false,
            error: Some(format!(
                "Discount percentage exceeds maximum of {}%",
                policy.max_discount_pct
            )),
        };
    }

    let requires_approval = policy.require_approval && discount_pct > policy.approval_threshold;

    DiscountCheck {
        is_valid: true,
        requires_approval,
        error: None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_item_discount_percentage() {
        let amount = item_discount(
            d("200.00"),
            Some(DiscountKind::Percentage),
            Some(d("15")),
        );
        assert_eq!(amount, d("30.00"));
    }

    #[test]
    fn test_item_discount_fixed_caps_at_price() {
        // Fixed discount of 1000 on a 100-priced item caps at 100, not 1000
        let amount = item_discount(d("100.00"), Some(DiscountKind::Fixed), Some(d("1000.00")));
        assert_eq!(amount, d("100.00"));
    }

    #[test]
    fn test_item_discount_missing_is_noop() {
        assert_eq!(item_discount(d("100.00"), None, None), Decimal::ZERO);
        assert_eq!(
            item_discount(d("100.00"), Some(DiscountKind::Fixed), None),
            Decimal::ZERO
        );
        assert_eq!(
            item_discount(d("100.00"), None, Some(d("5.00"))),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_item_discount_zero_or_negative_value_is_noop() {
        assert_eq!(
            item_discount(d("100.00"), Some(DiscountKind::Percentage), Some(Decimal::ZERO)),
            Decimal::ZERO
        );
        assert_eq!(
            item_discount(d("100.00"), Some(DiscountKind::Fixed), Some(d("-5"))),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_percentage_above_100_not_blocked_here() {
        // Only validate_discount enforces a ceiling, and only if called
        let amount = item_discount(
            d("100.00"),
            Some(DiscountKind::Percentage),
            Some(d("150")),
        );
        assert_eq!(amount, d("150.00"));
    }

    #[test]
    fn test_total_discounts_pipeline() {
        // Two lines: 3 × 10.00 with 1.00 off each, 2 × 25.00 undiscounted.
        // Gross 80.00, item discounts 3.00, after items 77.00.
        // 10% transaction discount on 77.00 = 7.70.
        let items = [
            PricedLine {
                unit_price: d("10.00"),
                quantity: d("3"),
                discount: d("1.00"),
            },
            PricedLine {
                unit_price: d("25.00"),
                quantity: d("2"),
                discount: Decimal::ZERO,
            },
        ];

        let totals = total_discounts(&items, Some(DiscountKind::Percentage), Some(d("10")));
        assert_eq!(totals.item_discounts_total, d("3.00"));
        assert_eq!(totals.transaction_discount, d("7.70"));
        assert_eq!(totals.total_discount, d("10.70"));
        assert_eq!(totals.subtotal_after_discount, d("69.30"));
    }

    #[test]
    fn test_total_discounts_clamps_at_zero() {
        let items = [PricedLine {
            unit_price: d("10.00"),
            quantity: d("1"),
            discount: Decimal::ZERO,
        }];

        // Fixed transaction discount larger than the subtotal caps at the
        // subtotal, so the clamp holds at exactly zero.
        let totals = total_discounts(&items, Some(DiscountKind::Fixed), Some(d("50.00")));
        assert_eq!(totals.transaction_discount, d("10.00"));
        assert_eq!(totals.subtotal_after_discount, Decimal::ZERO);

        // A >100% percentage discount pushes past zero; clamp still holds.
        let totals = total_discounts(&items, Some(DiscountKind::Percentage), Some(d("150")));
        assert_eq!(totals.subtotal_after_discount, Decimal::ZERO);
    }

    #[test]
    fn test_vat_disabled() {
        let breakdown = vat(d("250.00"), &VatConfig::disabled());
        assert_eq!(breakdown.vat_amount, Decimal::ZERO);
        assert_eq!(breakdown.final_total, d("250.00"));
    }

    #[test]
    fn test_vat_inclusive_12_pct() {
        // Quoted 112.00 already contains 12.00 of VAT; total unchanged
        let config = VatConfig {
            enabled: true,
            rate: d("12"),
            tax_inclusive: true,
        };
        let breakdown = vat(d("112.00"), &config);
        assert_eq!(breakdown.vat_amount, d("12.00"));
        assert_eq!(breakdown.final_total, d("112.00"));
    }

    #[test]
    fn test_vat_exclusive_12_pct() {
        let config = VatConfig {
            enabled: true,
            rate: d("12"),
            tax_inclusive: false,
        };
        let breakdown = vat(d("100.00"), &config);
        assert_eq!(breakdown.vat_amount, d("12.00"));
        assert_eq!(breakdown.final_total, d("112.00"));
    }

    #[test]
    fn test_vat_rounds_at_output_only() {
        // 33.33 at 7.5% exclusive: raw VAT 2.49975 rounds to 2.50 at output,
        // and the total is computed from the unrounded VAT
        let config = VatConfig {
            enabled: true,
            rate: d("7.5"),
            tax_inclusive: false,
        };
        let breakdown = vat(d("33.33"), &config);
        assert_eq!(breakdown.vat_amount, d("2.50"));
        assert_eq!(breakdown.final_total, d("35.83"));
    }

    #[test]
    fn test_validate_discount_rejects_negative() {
        let policy = DiscountPolicy {
            max_discount_pct: d("50"),
            require_approval: true,
            approval_threshold: d("20"),
        };
        let check = validate_discount(d("-5"), &policy);
        assert!(!check.is_valid);
        assert!(check.error.is_some());
    }

    #[test]
    fn test_validate_discount_rejects_above_max() {
        let policy = DiscountPolicy {
            max_discount_pct: d("50"),
            require_approval: false,
            approval_threshold: d("20"),
        };
        let check = validate_discount(d("60"), &policy);
        assert!(!check.is_valid);
    }

    #[test]
    fn test_validate_discount_flags_approval() {
        let policy = DiscountPolicy {
            max_discount_pct: d("50"),
            require_approval: true,
            approval_threshold: d("20"),
        };

        let check = validate_discount(d("25"), &policy);
        assert!(check.is_valid);
        assert!(check.requires_approval);

        // Below the threshold: no approval needed
        let check = validate_discount(d("15"), &policy);
        assert!(check.is_valid);
        assert!(!check.requires_approval);

        // Approval not mandated: flag never raised
        let lax = DiscountPolicy {
            require_approval: false,
            ..policy
        };
        let check = validate_discount(d("25"), &lax);
        assert!(check.is_valid);
        assert!(!check.requires_approval);
    }
}
