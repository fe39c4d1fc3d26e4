//! # bodega-db: Persistence Layer for Bodega
//!
//! SQLite persistence for the Bodega transactional core.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    bodega-core (pure logic)                     │
//! │        pricing • stock planning • aging • receipt numbers       │
//! └───────────────────────────┬─────────────────────────────────────┘
//!                             │ plans and calculations
//! ┌───────────────────────────▼─────────────────────────────────────┐
//! │                ★ bodega-db (THIS CRATE) ★                       │
//! │                                                                 │
//! │   Database ──► ProductRepository                                │
//! │            ──► InventoryRepository   (batches, FIFO deduction)  │
//! │            ──► SaleRepository        (the sale orchestrator)    │
//! │            ──► ObligationRepository  (AR/AP ledger)             │
//! │            ──► ReferenceRepository                              │
//! │            ──► SettingsRepository                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Division of Labor
//! bodega-core decides; bodega-db applies. Repositories load current rows,
//! hand them to the pure functions, and persist the results inside a single
//! transaction per operation. Business rules never live in SQL.
//!
//! ## Key Properties
//! - **Atomic operations**: every mutating entry point is one transaction
//! - **Decimal fidelity**: money and quantities stored as decimal TEXT,
//!   never floating point
//! - **WAL mode**: readers don't block the single serialized writer
//! - **Embedded migrations**: schema ships inside the binary

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::inventory::{InventoryRepository, LowStockItem, ReceiveStock};
pub use repository::obligation::{NewObligation, ObligationRepository};
pub use repository::product::ProductRepository;
pub use repository::reference::{ReferenceItem, ReferenceKind, ReferenceRepository};
pub use repository::sale::{CompletedSale, SaleInput, SaleItemInput, SaleRepository};
pub use repository::settings::{CompanySettings, SettingsRepository};
