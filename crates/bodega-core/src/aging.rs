//! # Aging Buckets
//!
//! Classifies open AR/AP balances by distance from their due date.
//!
//! ## Buckets
//! ```text
//! days_overdue = today − due_date (floor, in days)
//!
//! > 90 ──► "90+"     > 60 ──► "61-90"     > 30 ──► "31-60"    else "0-30"
//! ```
//! The youngest bucket includes not-yet-due obligations (negative
//! days_overdue): the bucket measures distance from the due date, not
//! delinquency.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Obligation;

// =============================================================================
// Bucket Assignment
// =============================================================================

/// One of the four fixed aging buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgingBucket {
    Days0To30,
    Days31To60,
    Days61To90,
    Over90,
}

impl AgingBucket {
    /// Report label for this bucket.
    pub fn label(&self) -> &'static str {
        match self {
            AgingBucket::Days0To30 => "0-30",
            AgingBucket::Days31To60 => "31-60",
            AgingBucket::Days61To90 => "61-90",
            AgingBucket::Over90 => "90+",
        }
    }

    /// Assigns a bucket from a days-overdue count.
    pub fn for_days_overdue(days: i64) -> Self {
        if days > 90 {
            AgingBucket::Over90
        } else if days > 60 {
            AgingBucket::Days61To90
        } else if days > 30 {
            AgingBucket::Days31To60
        } else {
            AgingBucket::Days0To30
        }
    }
}

// =============================================================================
// Report Types
// =============================================================================

/// Count and summed balance for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketTotal {
    pub count: u64,
    pub total: Decimal,
}

/// The four fixed buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgingBuckets {
    pub days_0_30: BucketTotal,
    pub days_31_60: BucketTotal,
    pub days_61_90: BucketTotal,
    pub over_90: BucketTotal,
}

impl AgingBuckets {
    fn add(&mut self, bucket: AgingBucket, amount: Decimal) {
        let slot = match bucket {
            AgingBucket::Days0To30 => &mut self.days_0_30,
            AgingBucket::Days31To60 => &mut self.days_31_60,
            AgingBucket::Days61To90 => &mut self.days_61_90,
            AgingBucket::Over90 => &mut self.over_90,
        };
        slot.count += 1;
        slot.total += amount;
    }

    /// Sum across all four buckets.
    pub fn total(&self) -> Decimal {
        self.days_0_30.total + self.days_31_60.total + self.days_61_90.total + self.over_90.total
    }
}

/// Per-counterparty slice of the aging report, with its own 4-bucket
/// breakdown independent of the global buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterpartyAging {
    pub name: String,
    pub total_balance: Decimal,
    pub buckets: AgingBuckets,
}

/// Aging report over a set of open obligations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgingReport {
    pub buckets: AgingBuckets,
    /// Sum of all bucket totals == sum of all open balances.
    pub total_outstanding: Decimal,
    pub by_counterparty: Vec<CounterpartyAging>,
}

// =============================================================================
// Report Construction
// =============================================================================

/// Builds an aging report from open obligations.
///
/// Obligations with a zero balance contribute nothing and are skipped.
/// Counterparties are returned in name order for stable output.
pub fn build_aging_report(obligations: &[Obligation], today: NaiveDate) -> AgingReport {
    let mut buckets = AgingBuckets::default();
    let mut by_counterparty: Vec<CounterpartyAging> = Vec::new();

    for obligation in obligations {
        if obligation.balance <= Decimal::ZERO {
            continue;
        }

        let days_overdue = (today - obligation.due_date).num_days();
        let bucket = AgingBucket::for_days_overdue(days_overdue);

        buckets.add(bucket, obligation.balance);

        let idx = match by_counterparty
            .iter()
            .position(|c| c.name == obligation.counterparty)
        {
            Some(idx) => idx,
            None => {
                by_counterparty.push(CounterpartyAging {
                    name: obligation.counterparty.clone(),
                    total_balance: Decimal::ZERO,
                    buckets: AgingBuckets::default(),
                });
                by_counterparty.len() - 1
            }
        };
        by_counterparty[idx].total_balance += obligation.balance;
        by_counterparty[idx].buckets.add(bucket, obligation.balance);
    }

    by_counterparty.sort_by(|a, b| a.name.cmp(&b.name));

    AgingReport {
        total_outstanding: buckets.total(),
        buckets,
        by_counterparty,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
