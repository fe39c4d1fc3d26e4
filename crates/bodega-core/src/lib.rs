//! # bodega-core: Pure Business Logic for Bodega
//!
//! This crate is the heart of Bodega. It contains the transactional
//! money/inventory arithmetic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │             Web application (out of scope)                      │
//! │     route handlers ──► services ──► repositories                │
//! └───────────────────────────┬─────────────────────────────────────┘
//! ┌───────────────────────────▼─────────────────────────────────────┐
//! │               ★ bodega-core (THIS CRATE) ★                      │
//! │                                                                 │
//! │   pricing      stock        aging       receipt                 │
//! │   discounts    FEFO plans   buckets     numbering               │
//! │   VAT          avg cost     reports                             │
//! │                                                                 │
//! │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │
//! └───────────────────────────┬─────────────────────────────────────┘
//! ┌───────────────────────────▼─────────────────────────────────────┐
//! │             bodega-db (persistence layer)                       │
//! │     SQLite repositories, transactions, migrations               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, InventoryBatch, PosSale, Obligation)
//! - [`money`] - Decimal rounding and percentage helpers
//! - [`pricing`] - Discount and VAT calculation
//! - [`stock`] - Weighted-average cost and FIFO-by-expiry deduction planning
//! - [`receipt`] - Receipt number generation
//! - [`aging`] - AR/AP aging buckets and reports
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, always
//! 2. **No I/O**: database, network, and file system access are FORBIDDEN
//! 3. **Decimal Money**: all monetary and quantity values are
//!    `rust_decimal::Decimal`; rounding happens only at output boundaries
//! 4. **Plan, Don't Mutate**: the deduction planner returns what WOULD
//!    change; the persistence layer applies it atomically
//! 5. **Explicit Errors**: typed errors with operator-facing messages,
//!    never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aging;
pub mod error;
pub mod money;
pub mod pricing;
pub mod receipt;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single POS sale.
///
/// Prevents runaway carts and keeps the atomic deduction transaction
/// bounded.
pub const MAX_SALE_ITEMS: usize = 100;
