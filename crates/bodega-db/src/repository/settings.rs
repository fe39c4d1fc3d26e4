//! # Settings Repository
//!
//! The single-row company settings table: VAT configuration and the
//! discount policy.
//!
//! Callers read the settings once per operation and pass the resulting
//! `VatConfig` / `DiscountPolicy` into the pure calculators, so one sale
//! always computes under one consistent configuration.

use sqlx::{Row, SqlitePool};
use tracing::info;

use bodega_core::{DiscountPolicy, VatConfig};

use crate::error::DbResult;
use crate::repository::get_decimal;

/// The company settings row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompanySettings {
    pub vat: VatConfig,
    pub discounts: DiscountPolicy,
}

/// Repository for company settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads the settings row (seeded by the initial migration, always
    /// present).
    pub async fn get(&self) -> DbResult<CompanySettings> {
        let row = sqlx::query(
            r#"
            SELECT vat_enabled, vat_rate, tax_inclusive,
                   max_discount_pct, require_discount_approval,
                   discount_approval_threshold
            FROM company_settings
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CompanySettings {
            vat: VatConfig {
                enabled: row.try_get("vat_enabled")?,
                rate: get_decimal(&row, "vat_rate")?,
                tax_inclusive: row.try_get("tax_inclusive")?,
            },
            discounts: DiscountPolicy {
                max_discount_pct: get_decimal(&row, "max_discount_pct")?,
                require_approval: row.try_get("require_discount_approval")?,
                approval_threshold: get_decimal(&row, "discount_approval_threshold")?,
            },
        })
    }

    /// Replaces the VAT configuration.
    pub async fn update_vat(&self, vat: &VatConfig) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE company_settings
            SET vat_enabled = ?1, vat_rate = ?2, tax_inclusive = ?3
            WHERE id = 1
            "#,
        )
        .bind(vat.enabled)
        .bind(vat.rate.to_string())
        .bind(vat.tax_inclusive)
        .execute(&self.pool)
        .await?;

        info!(
            enabled = vat.enabled,
            rate = %vat.rate,
            inclusive = vat.tax_inclusive,
            "VAT configuration updated"
        );
        Ok(())
    }

    /// Replaces the discount policy.
    pub async fn update_discount_policy(&self, policy: &DiscountPolicy) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE company_settings
            SET max_discount_pct = ?1,
                require_discount_approval = ?2,
                discount_approval_threshold = ?3
            WHERE id = 1
            "#,
        )
        .bind(policy.max_discount_pct.to_string())
        .bind(policy.require_approval)
        .bind(policy.approval_threshold.to_string())
        .execute(&self.pool)
        .await?;

        info!(max = %policy.max_discount_pct, "Discount policy updated");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
