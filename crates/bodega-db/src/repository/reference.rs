//! # Reference Data Repository
//!
//! Uniform CRUD over the closed set of reference-data kinds: branches,
//! customers, suppliers, expense categories, and warehouses.
//!
//! The kind → table binding is a match on [`ReferenceKind`], so adding a
//! kind means adding an enum variant and a table - there is no dynamic
//! table-name dispatch, and nothing outside this enum can ever name a
//! table.
//!
//! Warehouses carry extra columns (branch link, capacity ceiling) and get
//! dedicated accessors alongside the uniform name-based ones.

use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use bodega_core::Warehouse;

use crate::error::{DbError, DbResult};
use crate::repository::get_opt_decimal;

// =============================================================================
// Kinds
// =============================================================================

/// The five reference-data kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Warehouse,
    Branch,
    Customer,
    Supplier,
    ExpenseCategory,
}

impl ReferenceKind {
    /// The backing table for this kind.
    fn table(&self) -> &'static str {
        match self {
            ReferenceKind::Warehouse => "warehouses",
            ReferenceKind::Branch => "branches",
            ReferenceKind::Customer => "customers",
            ReferenceKind::Supplier => "suppliers",
            ReferenceKind::ExpenseCategory => "expense_categories",
        }
    }

    /// Entity name used in error messages.
    fn entity(&self) -> &'static str {
        match self {
            ReferenceKind::Warehouse => "Warehouse",
            ReferenceKind::Branch => "Branch",
            ReferenceKind::Customer => "Customer",
            ReferenceKind::Supplier => "Supplier",
            ReferenceKind::ExpenseCategory => "Expense category",
        }
    }
}

/// One reference-data row, as the uniform operations see it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceItem {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for reference data.
#[derive(Debug, Clone)]
pub struct ReferenceRepository {
    pool: SqlitePool,
}

impl ReferenceRepository {
    /// Creates a new ReferenceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReferenceRepository { pool }
    }

    /// Creates a reference row of the given kind; returns its ID.
    ///
    /// Names are unique per kind (schema-enforced).
    pub async fn create(&self, kind: ReferenceKind, name: &str) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();

        debug!(kind = kind.entity(), name = %name, "Creating reference row");

        let sql = format!("INSERT INTO {} (id, name) VALUES (?1, ?2)", kind.table());
        sqlx::query(&sql)
            .bind(&id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    /// Lists all rows of a kind in name order.
    pub async fn list(&self, kind: ReferenceKind) -> DbResult<Vec<ReferenceItem>> {
        let sql = format!("SELECT id, name FROM {} ORDER BY name", kind.table());
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                Ok(ReferenceItem {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    /// Renames a reference row.
    pub async fn rename(&self, kind: ReferenceKind, id: &str, name: &str) -> DbResult<()> {
        let sql = format!("UPDATE {} SET name = ?2 WHERE id = ?1", kind.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(kind.entity(), id));
        }
        Ok(())
    }

    /// Deletes a reference row. Rows referenced elsewhere (a warehouse
    /// holding batches) fail with a foreign key violation.
    pub async fn delete(&self, kind: ReferenceKind, id: &str) -> DbResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(kind.entity(), id));
        }
        Ok(())
    }

    /// Creates a warehouse with its branch link and capacity ceiling.
    pub async fn create_warehouse(&self, warehouse: &Warehouse) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO warehouses (id, name, branch_id, max_capacity)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&warehouse.id)
        .bind(&warehouse.name)
        .bind(&warehouse.branch_id)
        .bind(warehouse.max_capacity.map(|c| c.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a warehouse with its capacity configuration.
    pub async fn get_warehouse(&self, id: &str) -> DbResult<Option<Warehouse>> {
        let row = sqlx::query(
            "SELECT id, name, branch_id, max_capacity FROM warehouses WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Warehouse {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                branch_id: row.try_get("branch_id")?,
                max_capacity: get_opt_decimal(&row, "max_capacity")?,
            })),
            None => Ok(None),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
