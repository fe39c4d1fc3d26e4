//! # Obligation Repository
//!
//! The accounts receivable / payable ledger: obligations, payments against
//! them, and the aging report.
//!
//! ## Payment Recompute
//! ```text
//! record_payment
//!   ├── BEGIN
//!   ├── load obligation        (NotFound if missing)
//!   ├── amount > 0?            (MustBePositive)
//!   ├── amount <= balance?     (Overpayment - balance is never negative)
//!   ├── INSERT payment row
//!   ├── paid += amount, balance = total - paid
//!   ├── status: paid when balance == 0, else partial
//!   ├── overdue check LAST: due < today && balance > 0 → overdue
//!   │     (a fully settled record is never relabeled overdue)
//!   └── COMMIT
//! ```
//! Status is recomputed from the updated amounts on every payment, never
//! patched independently of them.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use bodega_core::aging::{build_aging_report, AgingReport};
use bodega_core::validation::{validate_money, validate_payment_amount};
use bodega_core::{
    CoreError, Obligation, ObligationKind, ObligationPayment, ObligationStatus, PaymentMethod,
};

use crate::error::{DbError, DbResult};
use crate::repository::{get_decimal, get_enum};

// =============================================================================
// Inputs
// =============================================================================

/// Input for opening a new obligation.
///
/// Credit sales create receivables through the sale orchestrator instead;
/// this entry point covers payables (purchase receiving) and manually
/// entered receivables.
#[derive(Debug, Clone)]
pub struct NewObligation {
    pub kind: ObligationKind,
    pub counterparty: String,
    pub branch_id: Option<String>,
    /// Source document reference (receipt number, PO number).
    pub reference: Option<String>,
    pub total_amount: Decimal,
    pub due_date: NaiveDate,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for AR/AP obligations.
#[derive(Debug, Clone)]
pub struct ObligationRepository {
    pool: SqlitePool,
}

impl ObligationRepository {
    /// Creates a new ObligationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ObligationRepository { pool }
    }

    /// Opens a new obligation with status `pending` and a full balance.
    pub async fn create(&self, input: &NewObligation) -> DbResult<Obligation> {
        validate_money("total_amount", input.total_amount)?;

        let obligation = Obligation {
            id: Uuid::new_v4().to_string(),
            kind: input.kind,
            counterparty: input.counterparty.clone(),
            branch_id: input.branch_id.clone(),
            reference: input.reference.clone(),
            total_amount: input.total_amount,
            paid_amount: Decimal::ZERO,
            balance: input.total_amount,
            due_date: input.due_date,
            status: ObligationStatus::Pending,
            created_at: Utc::now(),
        };

        let mut conn = self.pool.acquire().await?;
        insert_obligation_on_conn(&mut conn, &obligation).await?;

        debug!(
            id = %obligation.id,
            kind = obligation.kind.as_str(),
            counterparty = %obligation.counterparty,
            "Obligation created"
        );
        Ok(obligation)
    }

    /// Gets an obligation by its ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Obligation>> {
        let row = sqlx::query(
            r#"
            SELECT id, kind, counterparty, branch_id, reference, total_amount,
                   paid_amount, balance, due_date, status, created_at
            FROM obligations
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_obligation).transpose()
    }

    /// Lists unsettled obligations of a kind, soonest due first.
    pub async fn list_open(&self, kind: ObligationKind) -> DbResult<Vec<Obligation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, kind, counterparty, branch_id, reference, total_amount,
                   paid_amount, balance, due_date, status, created_at
            FROM obligations
            WHERE kind = ?1 AND status != 'paid'
            ORDER BY due_date, id
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_obligation).collect()
    }

    /// Records a payment against an obligation and recomputes its balance
    /// and status, all in one transaction.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - obligation doesn't exist
    /// * `ValidationError::MustBePositive` - amount <= 0
    /// * `CoreError::Overpayment` - amount exceeds the outstanding balance;
    ///   partial settlement of the excess is never attempted
    pub async fn record_payment(
        &self,
        obligation_id: &str,
        amount: Decimal,
        method: PaymentMethod,
        reference_number: Option<&str>,
        payment_date: NaiveDate,
    ) -> DbResult<Obligation> {
        validate_payment_amount(amount)?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT id, kind, counterparty, branch_id, reference, total_amount,
                   paid_amount, balance, due_date, status, created_at
            FROM obligations
            WHERE id = ?1
            "#,
        )
        .bind(obligation_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Obligation", obligation_id))?;

        let mut obligation = map_obligation(&row)?;

        if amount > obligation.balance {
            return Err(DbError::Domain(CoreError::Overpayment {
                amount,
                balance: obligation.balance,
            }));
        }

        sqlx::query(
            r#"
            INSERT INTO obligation_payments (
                id, obligation_id, amount, method,
                reference_number, payment_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(obligation_id)
        .bind(amount.to_string())
        .bind(method.as_str())
        .bind(reference_number)
        .bind(payment_date)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        obligation.paid_amount += amount;
        obligation.balance = obligation.total_amount - obligation.paid_amount;

        obligation.status = if obligation.balance.is_zero() {
            ObligationStatus::Paid
        } else {
            ObligationStatus::Partial
        };

        // Overdue check runs last so it can never relabel a settled record
        let today = Utc::now().date_naive();
        if obligation.due_date < today && obligation.balance > Decimal::ZERO {
            obligation.status = ObligationStatus::Overdue;
        }

        sqlx::query(
            r#"
            UPDATE obligations
            SET paid_amount = ?2, balance = ?3, status = ?4
            WHERE id = ?1
            "#,
        )
        .bind(obligation_id)
        .bind(obligation.paid_amount.to_string())
        .bind(obligation.balance.to_string())
        .bind(obligation.status.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            obligation_id = %obligation_id,
            amount = %amount,
            balance = %obligation.balance,
            status = obligation.status.as_str(),
            "Payment recorded"
        );
        Ok(obligation)
    }

    /// Lists payments against an obligation, oldest first.
    pub async fn payments(&self, obligation_id: &str) -> DbResult<Vec<ObligationPayment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, obligation_id, amount, method,
                   reference_number, payment_date, created_at
            FROM obligation_payments
            WHERE obligation_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(obligation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_payment).collect()
    }

    /// Builds the aging report for one side of the ledger.
    ///
    /// Balances are bucketed by days overdue relative to `today`; settled
    /// obligations contribute nothing. Bucketing itself lives in
    /// `bodega_core::aging` - this only loads the rows.
    pub async fn aging_report(
        &self,
        kind: ObligationKind,
        branch_id: Option<&str>,
        today: NaiveDate,
    ) -> DbResult<AgingReport> {
        let rows = match branch_id {
            Some(branch) => {
                sqlx::query(
                    r#"
                    SELECT id, kind, counterparty, branch_id, reference, total_amount,
                           paid_amount, balance, due_date, status, created_at
                    FROM obligations
                    WHERE kind = ?1 AND branch_id = ?2 AND status != 'paid'
                    "#,
                )
                .bind(kind.as_str())
                .bind(branch)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, kind, counterparty, branch_id, reference, total_amount,
                           paid_amount, balance, due_date, status, created_at
                    FROM obligations
                    WHERE kind = ?1 AND status != 'paid'
                    "#,
                )
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await?
            }
        };

        let obligations: Vec<Obligation> = rows
            .iter()
            .map(map_obligation)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(build_aging_report(&obligations, today))
    }
}

// =============================================================================
// Connection-Level Helpers
// =============================================================================

/// Inserts an obligation row on an existing connection.
///
/// The sale orchestrator uses this to open the receivable for a credit
/// sale inside the sale's own transaction.
pub(crate) async fn insert_obligation_on_conn(
    conn: &mut SqliteConnection,
    obligation: &Obligation,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO obligations (
            id, kind, counterparty, branch_id, reference, total_amount,
            paid_amount, balance, due_date, status, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&obligation.id)
    .bind(obligation.kind.as_str())
    .bind(&obligation.counterparty)
    .bind(&obligation.branch_id)
    .bind(&obligation.reference)
    .bind(obligation.total_amount.to_string())
    .bind(obligation.paid_amount.to_string())
    .bind(obligation.balance.to_string())
    .bind(obligation.due_date)
    .bind(obligation.status.as_str())
    .bind(obligation.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn map_obligation(row: &SqliteRow) -> DbResult<Obligation> {
    Ok(Obligation {
        id: row.try_get("id")?,
        kind: get_enum(row, "kind")?,
        counterparty: row.try_get("counterparty")?,
        branch_id: row.try_get("branch_id")?,
        reference: row.try_get("reference")?,
        total_amount: get_decimal(row, "total_amount")?,
        paid_amount: get_decimal(row, "paid_amount")?,
        balance: get_decimal(row, "balance")?,
        due_date: row.try_get("due_date")?,
        status: get_enum(row, "status")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_payment(row: &SqliteRow) -> DbResult<ObligationPayment> {
    Ok(ObligationPayment {
        id: row.try_get("id")?,
        obligation_id: row.try_get("obligation_id")?,
        amount: get_decimal(row, "amount")?,
        method: get_enum(row, "method")?,
        reference_number: row.try_get("reference_number")?,
        payment_date: row.try_get("payment_date")?,
        created_at: row.try_get("created_at")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
