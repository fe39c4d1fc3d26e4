//! # Validation Module
//!
//! Input validation utilities, run before business logic.
//!
//! Validation failures are always recoverable by the caller correcting
//! input and are never retried automatically. Database constraints
//! (NOT NULL, UNIQUE, foreign keys) back these checks up at the storage
//! layer.

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::MAX_SALE_ITEMS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity: strictly positive.
pub fn validate_quantity(qty: Decimal) -> ValidationResult<()> {
    if qty <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a monetary amount that may be zero (prices, costs).
pub fn validate_money(field: &str, amount: Decimal) -> ValidationResult<()> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a payment amount: strictly positive.
///
/// Zero and negative payments are malformed input, distinct from the
/// overpayment check which compares against the outstanding balance.
pub fn validate_payment_amount(amount: Decimal) -> ValidationResult<()> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a batch number.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Alphanumeric, hyphens, and underscores only
pub fn validate_batch_number(batch_number: &str) -> ValidationResult<()> {
    let batch_number = batch_number.trim();

    if batch_number.is_empty() {
        return Err(ValidationError::Required {
            field: "batch_number".to_string(),
        });
    }

    if batch_number.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "batch_number".to_string(),
            max: 50,
        });
    }

    if !batch_number
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "batch_number".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates an adjustment/deduction reason: required, non-empty.
///
/// Every stock mutation outside a sale is logged with its reason; a blank
/// reason defeats the audit trail.
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    if reason.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }
    Ok(())
}

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of line items in a sale.
pub fn validate_sale_items(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "sale items".to_string(),
        });
    }

    if count > MAX_SALE_ITEMS {
        return Err(ValidationError::InvalidFormat {
            field: "sale items".to_string(),
            reason: format!("at most {MAX_SALE_ITEMS} line items per sale"),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(Decimal::ONE).is_ok());
        assert!(validate_quantity("0.25".parse().unwrap()).is_ok());
        assert!(validate_quantity(Decimal::ZERO).is_err());
        assert!(validate_quantity(Decimal::NEGATIVE_ONE).is_err());
    }

    #[test]
    fn test_validate_money() {
        assert!(validate_money("price", Decimal::ZERO).is_ok());
        assert!(validate_money("price", "10.99".parse().unwrap()).is_ok());
        assert!(validate_money("price", "-0.01".parse().unwrap()).is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount("0.01".parse().unwrap()).is_ok());
        assert!(validate_payment_amount(Decimal::ZERO).is_err());
        assert!(validate_payment_amount("-5".parse().unwrap()).is_err());
    }

    #[test]
    fn test_validate_batch_number() {
        assert!(validate_batch_number("BATCH-2026-001").is_ok());
        assert!(validate_batch_number("").is_err());
        assert!(validate_batch_number("   ").is_err());
        assert!(validate_batch_number("has space").is_err());
        assert!(validate_batch_number(&"A".repeat(60)).is_err());
    }

    #[test]
    fn test_validate_reason() {
        assert!(validate_reason("damaged in transit").is_ok());
        assert!(validate_reason("").is_err());
        assert!(validate_reason("   ").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_sale_items() {
        assert!(validate_sale_items(1).is_ok());
        assert!(validate_sale_items(MAX_SALE_ITEMS).is_ok());
        assert!(validate_sale_items(0).is_err());
        assert!(validate_sale_items(MAX_SALE_ITEMS + 1).is_err());
    }
}
