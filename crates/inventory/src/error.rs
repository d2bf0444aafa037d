//! Unified error handling for the inventory engine.
//!
//! Shortages are not errors: `NO_STOCK` and `INSUFFICIENT_STOCK` are carried
//! on the [`crate::models::AllocationPlan`] itself and callers branch on
//! `can_fulfill`. The types here cover the remaining taxonomy: validation
//! faults (rejected before any write), commit-time races, and store faults.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::db::{CommitError, RepositoryError};

/// Validation faults on receiving input. Nothing is persisted when one of
/// these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Expiry date must be strictly after production date.
    #[error("expiry date {exp_date} is not after production date {prod_date}")]
    ExpiryBeforeProduction {
        prod_date: NaiveDate,
        exp_date: NaiveDate,
    },

    /// Received quantity must be positive.
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(i32),

    /// Cost price cannot be negative.
    #[error("cost price cannot be negative, got {0}")]
    NegativeCost(Decimal),
}

/// Top-level error type for engine operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Input rejected before any write.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Store operation failed; the caller owns retry/backoff policy.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Commit failed; see [`CommitError`] for whether the plan was stale.
    #[error("commit failed: {0}")]
    Commit(#[from] CommitError),
}

impl InventoryError {
    /// True when the failure means "re-plan and try again", as opposed to an
    /// infrastructure fault.
    #[must_use]
    pub const fn is_stale_plan(&self) -> bool {
        matches!(
            self,
            Self::Commit(CommitError::StalePlan { .. } | CommitError::BatchMissing(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::BatchId;

    #[test]
    fn test_stale_plan_classification() {
        let err = InventoryError::from(CommitError::StalePlan {
            batch_id: BatchId::new(1),
            requested: 5,
            available: 2,
        });
        assert!(err.is_stale_plan());

        let err = InventoryError::from(RepositoryError::NotFound);
        assert!(!err.is_stale_plan());
    }

    #[test]
    fn test_validation_error_message() {
        let err = ValidationError::NonPositiveQuantity(0);
        assert_eq!(err.to_string(), "quantity must be positive, got 0");
    }
}
