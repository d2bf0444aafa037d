//! FIFO allocation planning and atomic commit.
//!
//! Planning reads a snapshot of active batches and computes which batches
//! to consume, oldest production date first. The plan is plain data; two
//! callers may plan against the same snapshot and both see the same stock.
//! Commit is where allocations serialize: the repository applies all lines
//! in one transaction, re-validating quantities under row locks, and a plan
//! invalidated by a concurrent commit fails whole with
//! [`CommitError::StalePlan`].

use chrono::{NaiveDate, Utc};

use stockroom_core::ProductId;

use crate::db::{BatchRepository, CommitError};
use crate::error::{InventoryError, ValidationError};
use crate::models::{Alert, AllocationLine, AllocationPlan, Batch, BatchUpdateResult};

/// A batch expiring within this many days raises a `NearExpiry` alert on
/// any plan that consumes it.
pub const NEAR_EXPIRY_WINDOW_DAYS: i64 = 30;

/// Plans FIFO allocations. Read-only; never mutates the store.
pub struct FifoAllocator<'a, R> {
    repo: &'a R,
}

impl<'a, R: BatchRepository> FifoAllocator<'a, R> {
    /// Create an allocator backed by the given repository.
    #[must_use]
    pub const fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Plan an allocation of `required_quantity` units of a product.
    ///
    /// Shortages are reported on the plan itself (`can_fulfill = false` plus
    /// a `NoStock` or `InsufficientStock` alert), not as errors.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Validation`] when `required_quantity` is
    /// not positive (a negative requirement would otherwise plan negative
    /// lines, and committing those would grow a batch), or
    /// [`InventoryError::Repository`] if the active-batch query fails.
    pub async fn allocate(
        &self,
        product_id: ProductId,
        required_quantity: i32,
    ) -> Result<AllocationPlan, InventoryError> {
        if required_quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity(required_quantity).into());
        }
        let batches = self.repo.active_batches(product_id).await?;
        let today = Utc::now().date_naive();
        Ok(plan_fifo(product_id, required_quantity, batches, today))
    }
}

/// Applies previously planned allocations to the store.
pub struct AllocationCommitter<'a, R> {
    repo: &'a R,
}

impl<'a, R: BatchRepository> AllocationCommitter<'a, R> {
    /// Create a committer backed by the given repository.
    #[must_use]
    pub const fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Atomically decrement batch quantities per the plan's lines.
    ///
    /// # Errors
    ///
    /// Returns [`CommitError::StalePlan`] when a concurrent commit has
    /// invalidated the plan (nothing is applied; the caller should re-plan),
    /// or a repository error for store faults.
    pub async fn commit(
        &self,
        lines: &[AllocationLine],
    ) -> Result<Vec<BatchUpdateResult>, CommitError> {
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        match self.repo.commit_allocation(lines).await {
            Ok(results) => {
                let depleted = results.iter().filter(|r| r.new_quantity == 0).count();
                tracing::info!(
                    batches = results.len(),
                    depleted,
                    "Allocation committed"
                );
                Ok(results)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Allocation commit failed");
                Err(err)
            }
        }
    }
}

/// FIFO ordering key: oldest production date first (missing dates last),
/// ties broken by receipt order, then by ID for determinism.
fn fifo_key(batch: &Batch) -> (bool, Option<NaiveDate>, chrono::DateTime<Utc>, i32) {
    (
        batch.prod_date.is_none(),
        batch.prod_date,
        batch.received_date,
        batch.id.as_i32(),
    )
}

/// Compute an allocation plan from a snapshot of active batches.
///
/// Pure with respect to the store; repeated calls against the same snapshot
/// yield identical plans.
fn plan_fifo(
    product_id: ProductId,
    required_quantity: i32,
    mut batches: Vec<Batch>,
    today: NaiveDate,
) -> AllocationPlan {
    // The repository already orders its result; sorting again keeps the
    // plan deterministic regardless of backend.
    batches.sort_by_key(fifo_key);

    if batches.is_empty() {
        return AllocationPlan {
            can_fulfill: false,
            total_available: 0,
            required_quantity,
            lines: Vec::new(),
            alerts: vec![Alert::NoStock { product_id }],
            recommendation: None,
        };
    }

    let total_available: i64 = batches.iter().map(|b| i64::from(b.quantity)).sum();
    if total_available < i64::from(required_quantity) {
        return AllocationPlan {
            can_fulfill: false,
            total_available,
            required_quantity,
            lines: Vec::new(),
            alerts: vec![Alert::InsufficientStock {
                product_id,
                required: required_quantity,
                available: total_available,
            }],
            recommendation: None,
        };
    }

    let mut lines = Vec::new();
    let mut remaining = required_quantity;
    for batch in &batches {
        if remaining == 0 {
            break;
        }
        let take = batch.quantity.min(remaining);
        remaining -= take;
        lines.push(AllocationLine {
            batch_id: batch.id,
            quantity: take,
            prod_date: batch.prod_date,
            exp_date: batch.exp_date,
            received_date: batch.received_date,
            batch_number: batch.batch_number.clone(),
            cost_price: batch.cost_price,
            supplier_id: batch.supplier_id,
        });
    }

    let alerts = plan_alerts(&lines, today);
    let recommendation = Some(recommendation_for(&lines));

    AllocationPlan {
        can_fulfill: true,
        total_available,
        required_quantity,
        lines,
        alerts,
        recommendation,
    }
}

/// Advisory alerts for a fulfillable plan.
fn plan_alerts(lines: &[AllocationLine], today: NaiveDate) -> Vec<Alert> {
    let mut alerts = Vec::new();

    // Splitting a quantity within one date cohort is not a FIFO choice; the
    // alert only fires when the spanned batches carry differing dates.
    if lines.len() > 1 {
        let first_cohort = lines.first().map(|l| (l.prod_date, l.exp_date));
        let mixed = lines
            .iter()
            .any(|l| Some((l.prod_date, l.exp_date)) != first_cohort);
        if mixed {
            alerts.push(Alert::MultipleBatches {
                batch_count: lines.len(),
                batch_numbers: lines.iter().map(|l| l.batch_number.clone()).collect(),
            });
        }
    }

    for line in lines {
        let Some(exp_date) = line.exp_date else {
            continue;
        };
        let days_until_expiry = (exp_date - today).num_days();
        if days_until_expiry <= 0 {
            // Expired stock in an active set is a data-hygiene fault in the
            // surrounding system; surface it rather than silently picking.
            alerts.push(Alert::ExpiredStock {
                batch_id: line.batch_id,
                batch_number: line.batch_number.clone(),
                exp_date,
                days_until_expiry,
            });
        } else if days_until_expiry <= NEAR_EXPIRY_WINDOW_DAYS {
            alerts.push(Alert::NearExpiry {
                batch_id: line.batch_id,
                batch_number: line.batch_number.clone(),
                exp_date,
                days_until_expiry,
                quantity: line.quantity,
            });
        }
    }

    alerts
}

fn recommendation_for(lines: &[AllocationLine]) -> String {
    match lines {
        [] => "Nothing to pick".to_string(),
        [line] => format!(
            "Pick {} unit(s) from batch {}",
            line.quantity, line.batch_number
        ),
        _ => format!(
            "Pick across {} batches in the listed order, oldest production date first",
            lines.len()
        ),
    }
}
