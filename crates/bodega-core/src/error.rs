//! # Error Types
//!
//! Domain-specific error types for bodega-core.
//!
//! ## Error Flow
//! ```text
//! ValidationError → CoreError → DbError (bodega-db) → caller / operator
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (requested vs available, excess,
//!    outstanding balance) - messages are operator-facing and displayed
//!    verbatim by the caller
//! 3. Errors are enum variants, never bare Strings
//! 4. None of these are recovered locally: every error aborts the
//!    enclosing transaction and propagates

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They carry enough structured detail for the caller to act (clamp a
/// payment, reduce a requested quantity) without parsing the message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Requested deduction exceeds available active stock across all
    /// eligible batches.
    ///
    /// ## When This Occurs
    /// - Selling more than the warehouse holds
    /// - Two concurrent sales racing for the same batches (the losing
    ///   transaction re-validates and fails with this error)
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        requested: Decimal,
        available: Decimal,
    },

    /// The given unit of measure is neither the product's base UOM nor one
    /// of its alternates.
    #[error("Unknown unit of measure '{uom}' for product {product_id}")]
    UnknownUom { product_id: String, uom: String },

    /// Payment amount exceeds the outstanding balance.
    ///
    /// A payment may never bring an obligation's balance below zero. The
    /// actual balance is included so the UI can clamp.
    #[error("Payment amount {amount} exceeds outstanding balance {balance}")]
    Overpayment { amount: Decimal, balance: Decimal },

    /// Adding stock would exceed the warehouse's configured maximum
    /// capacity. `excess` is the amount over the limit, in base UOM.
    #[error("Warehouse capacity exceeded by {excess}")]
    CapacityExceeded { excess: Decimal },

    /// An explicitly supplied receipt number collides with an existing sale.
    #[error("Receipt number already exists: {0}")]
    DuplicateReceiptNumber(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements. Always
/// recoverable by the caller correcting input; never retried automatically.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., invalid UUID, malformed receipt number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., alternate UOM name repeated).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Cash tendered is less than the amount due.
    #[error("Amount received {received} is less than total {total}")]
    InsufficientTender { received: Decimal, total: Decimal },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            requested: Decimal::new(31, 0),
            available: Decimal::new(30, 0),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock: requested 31, available 30"
        );
    }

    #[test]
    fn test_overpayment_message_carries_balance() {
        let err = CoreError::Overpayment {
            amount: Decimal::new(60000, 2),
            balance: Decimal::new(50000, 2),
        };
        assert_eq!(
            err.to_string(),
            "Payment amount 600.00 exceeds outstanding balance 500.00"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "reason".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
