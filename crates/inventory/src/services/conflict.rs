//! Advisory date-conflict detection on receiving.
//!
//! Catches the human data-entry risk of booking stock in under the wrong
//! dates: if any existing active batch of the product carries a different
//! `(prod_date, exp_date)` pair than the proposed receipt, one advisory
//! alert lists every existing batch. Detection never blocks the receipt.

use chrono::NaiveDate;

use stockroom_core::ProductId;

use crate::db::{BatchRepository, RepositoryError};
use crate::models::{Alert, Batch, BatchDates};

/// Result of a conflict check.
#[derive(Debug)]
pub struct ConflictCheck {
    /// The advisory alert, when dates diverge.
    pub alert: Option<Alert>,
    /// All active batches of the product that were compared against.
    pub existing_batches: Vec<Batch>,
}

impl ConflictCheck {
    /// Whether the check produced an advisory alert.
    #[must_use]
    pub const fn has_alert(&self) -> bool {
        self.alert.is_some()
    }
}

/// Compares a proposed receipt's dates against existing active stock.
pub struct ConflictDetector<'a, R> {
    repo: &'a R,
}

impl<'a, R: BatchRepository> ConflictDetector<'a, R> {
    /// Create a detector backed by the given repository.
    #[must_use]
    pub const fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Check a proposed receipt against every unexhausted batch of the
    /// product.
    ///
    /// Comparison is calendar-date equality on the `(prod_date, exp_date)`
    /// pair; time-of-day never enters into it since batch dates are stored
    /// at day granularity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the active-batch query fails.
    pub async fn check_conflicts(
        &self,
        product_id: ProductId,
        prod_date: Option<NaiveDate>,
        exp_date: Option<NaiveDate>,
    ) -> Result<ConflictCheck, RepositoryError> {
        let existing_batches = self.repo.active_batches(product_id).await?;
        if existing_batches.is_empty() {
            return Ok(ConflictCheck {
                alert: None,
                existing_batches,
            });
        }

        let conflicting = existing_batches
            .iter()
            .any(|batch| (batch.prod_date, batch.exp_date) != (prod_date, exp_date));

        let alert = conflicting.then(|| Alert::DateConflict {
            product_id,
            prod_date,
            exp_date,
            existing: existing_batches
                .iter()
                .map(|batch| BatchDates {
                    batch_id: batch.id,
                    batch_number: batch.batch_number.clone(),
                    quantity: batch.quantity,
                    prod_date: batch.prod_date,
                    exp_date: batch.exp_date,
                })
                .collect(),
        });

        Ok(ConflictCheck {
            alert,
            existing_batches,
        })
    }
}
