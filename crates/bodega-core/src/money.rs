//! # Money Helpers
//!
//! Shared rounding and percentage helpers over `rust_decimal::Decimal`.
//!
//! ## Why Decimal?
//! ```text
//! In floating point:  0.1 + 0.2 = 0.30000000000000004   WRONG
//! With Decimal:       0.1 + 0.2 = 0.3                   exact
//! ```
//! Every monetary and quantity field in Bodega is a `Decimal`. Weighted
//! average costs and tax-inclusive VAT both divide, so intermediate values
//! carry more than two decimal places by design.
//!
//! ## Rounding Policy
//! Round ONLY at output boundaries (final VAT/total/COGS formatting to two
//! places), never mid-calculation. Rounding mid-stream compounds drift
//! across many line items.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places for monetary output values.
pub const MONEY_DP: u32 = 2;

/// Rounds a monetary amount to two decimal places.
///
/// Midpoint rounds away from zero (0.005 → 0.01), matching how totals are
/// presented on receipts.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use bodega_core::money::round_money;
///
/// let raw: Decimal = "12.005".parse().unwrap();
/// assert_eq!(round_money(raw).to_string(), "12.01");
/// ```
#[inline]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes `pct` percent of `amount` at full precision.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use bodega_core::money::percent_of;
///
/// let amount = Decimal::new(20000, 2); // 200.00
/// let pct = Decimal::new(15, 0);       // 15%
/// assert_eq!(percent_of(amount, pct), Decimal::new(30, 0));
/// ```
#[inline]
pub fn percent_of(amount: Decimal, pct: Decimal) -> Decimal {
    amount * pct / Decimal::ONE_HUNDRED
}

// =============================================================================
// Unit Tests
// =============================================================================
