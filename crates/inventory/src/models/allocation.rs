//! Allocation plan and expiry scan result types.
//!
//! Everything here is ephemeral: a plan is stateless data returned to the
//! caller, valid only against the snapshot it was computed from. Discarding
//! a plan before commit is the cancellation path.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stockroom_core::{BatchId, BatchStatus, ProductId, SupplierId};

use super::alert::Alert;

/// One batch consumed (fully or partially) by an allocation plan.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationLine {
    /// Batch to pick from.
    pub batch_id: BatchId,
    /// Units to pick from this batch.
    pub quantity: i32,
    /// Production date of the batch.
    pub prod_date: Option<NaiveDate>,
    /// Expiry date of the batch.
    pub exp_date: Option<NaiveDate>,
    /// When the batch was received.
    pub received_date: DateTime<Utc>,
    /// Human-readable batch number for pick lists.
    pub batch_number: String,
    /// Per-unit cost of this receipt.
    pub cost_price: Option<Decimal>,
    /// Supplier the batch came from.
    pub supplier_id: Option<SupplierId>,
}

/// The read-only, pre-commit result of FIFO allocation planning.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationPlan {
    /// Whether the required quantity can be satisfied from active stock.
    pub can_fulfill: bool,
    /// Sum of remaining quantity across all active batches.
    pub total_available: i64,
    /// Quantity the caller asked for.
    pub required_quantity: i32,
    /// Batches to consume, in FIFO order. Empty when `can_fulfill` is false.
    pub lines: Vec<AllocationLine>,
    /// All applicable alerts, shortage and advisory alike.
    pub alerts: Vec<Alert>,
    /// Non-binding human-readable picking recommendation.
    pub recommendation: Option<String>,
}

impl AllocationPlan {
    /// Total units across all lines.
    #[must_use]
    pub fn allocated_quantity(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.quantity)).sum()
    }
}

/// Outcome of applying one allocation line during commit.
#[derive(Debug, Clone, Serialize)]
pub struct BatchUpdateResult {
    /// Batch that was updated.
    pub batch_id: BatchId,
    /// Quantity before the decrement.
    pub previous_quantity: i32,
    /// Quantity after the decrement.
    pub new_quantity: i32,
    /// Status after the decrement (`Depleted` iff `new_quantity == 0`).
    pub status: BatchStatus,
}

/// Urgency bucket for a batch approaching expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryUrgency {
    /// Expires within 7 days.
    Critical,
    /// Expires within 14 days.
    High,
    /// Expires within 30 days (or the scan window, if larger).
    Medium,
}

impl ExpiryUrgency {
    /// Bucket a day count from the scan date.
    #[must_use]
    pub const fn for_days_until(days: i64) -> Self {
        if days <= 7 {
            Self::Critical
        } else if days <= 14 {
            Self::High
        } else {
            Self::Medium
        }
    }
}

/// One row of an expiry scan, joined with product identity for display.
#[derive(Debug, Clone, Serialize)]
pub struct ExpiryAlertEntry {
    /// Batch nearing expiry.
    pub batch_id: BatchId,
    /// Owning product.
    pub product_id: ProductId,
    /// Product display name, when the catalog has one.
    pub product_name: Option<String>,
    /// Human-readable batch number.
    pub batch_number: String,
    /// Units still remaining in the batch.
    pub quantity: i32,
    /// Expiry date driving the alert.
    pub exp_date: NaiveDate,
    /// Days between the scan date and expiry.
    pub days_until_expiry: i64,
    /// Urgency bucket.
    pub urgency: ExpiryUrgency,
}
