//! The receiving flow: validate, check dates, number, persist.
//!
//! Composes the conflict detector, the batch number generator, and the
//! store's creation primitive. A date conflict is returned alongside the
//! created batch as an advisory; it never blocks the receipt.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::db::{BatchRepository, RepositoryError};
use crate::error::{InventoryError, ValidationError};
use crate::models::{Alert, Batch, NewBatch, ReceiveBatchInput};
use crate::services::batch_number::BatchNumberGenerator;
use crate::services::conflict::ConflictDetector;

/// Outcome of receiving a new batch.
#[derive(Debug)]
pub struct ReceivedBatch {
    /// The persisted batch.
    pub batch: Batch,
    /// Advisory date-conflict alert, when the new dates diverge from
    /// existing active stock.
    pub conflict_alert: Option<Alert>,
}

/// Entry point for booking new stock into the store.
pub struct ReceivingService<'a, R> {
    repo: &'a R,
}

impl<'a, R: BatchRepository> ReceivingService<'a, R> {
    /// Create a receiving service backed by the given repository.
    #[must_use]
    pub const fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Receive a batch of stock.
    ///
    /// Validation happens before any write; nothing is persisted when the
    /// input is rejected. A batch number collision with a concurrent receipt
    /// is retried once with a freshly generated number.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Validation`] for malformed input and
    /// [`InventoryError::Repository`] for store faults.
    pub async fn receive(
        &self,
        input: &ReceiveBatchInput,
    ) -> Result<ReceivedBatch, InventoryError> {
        validate(input)?;

        let conflict = ConflictDetector::new(self.repo)
            .check_conflicts(input.product_id, input.prod_date, input.exp_date)
            .await?;
        if let Some(alert) = &conflict.alert {
            tracing::warn!(
                product_id = %input.product_id,
                existing = conflict.existing_batches.len(),
                "Date conflict on receipt: {alert}"
            );
        }

        let generator = BatchNumberGenerator::new(self.repo);
        let batch_number = generator.generate(input.product_id, input.prod_date).await;

        let batch = match self.create(input, batch_number).await {
            // A concurrent receipt won the race for this sequence number.
            // Retry once with the timestamp fallback; recounting could
            // produce the same collision.
            Err(RepositoryError::Conflict(_)) => {
                let retry_number =
                    crate::services::batch_number::fallback_number(input.product_id, Utc::now());
                self.create(input, retry_number).await?
            }
            other => other?,
        };

        tracing::info!(
            batch_id = %batch.id,
            product_id = %batch.product_id,
            batch_number = %batch.batch_number,
            quantity = batch.quantity,
            "Batch received"
        );

        Ok(ReceivedBatch {
            batch,
            conflict_alert: conflict.alert,
        })
    }

    async fn create(
        &self,
        input: &ReceiveBatchInput,
        batch_number: String,
    ) -> Result<Batch, RepositoryError> {
        self.repo
            .create_batch(&NewBatch {
                product_id: input.product_id,
                batch_number,
                quantity: input.quantity,
                prod_date: input.prod_date,
                exp_date: input.exp_date,
                supplier_id: input.supplier_id,
                supplier_order_id: input.supplier_order_id,
                cost_price: input.cost_price,
                notes: input.notes.clone(),
            })
            .await
    }
}

fn validate(input: &ReceiveBatchInput) -> Result<(), ValidationError> {
    if input.quantity <= 0 {
        return Err(ValidationError::NonPositiveQuantity(input.quantity));
    }
    if let (Some(prod_date), Some(exp_date)) = (input.prod_date, input.exp_date)
        && exp_date <= prod_date
    {
        return Err(ValidationError::ExpiryBeforeProduction {
            prod_date,
            exp_date,
        });
    }
    if let Some(cost) = input.cost_price
        && cost < Decimal::ZERO
    {
        return Err(ValidationError::NegativeCost(cost));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBatchRepository;
    use crate::services::test_support::{batch, date};
    use rust_decimal::Decimal;
    use stockroom_core::{BatchStatus, ProductId};

    fn input(product_id: i32, quantity: i32) -> ReceiveBatchInput {
        ReceiveBatchInput {
            product_id: ProductId::new(product_id),
            quantity,
            prod_date: None,
            exp_date: None,
            supplier_id: None,
            supplier_order_id: None,
            cost_price: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_receive_creates_active_batch_with_generated_number() {
        let repo = MemoryBatchRepository::new();
        let service = ReceivingService::new(&repo);

        let mut new = input(12, 50);
        new.prod_date = Some(date(2026, 8, 24));
        new.cost_price = Some(Decimal::new(1250, 2));

        let received = service.receive(&new).await.expect("receive");
        assert_eq!(received.batch.batch_number, "P12-20260824-001");
        assert_eq!(received.batch.quantity, 50);
        assert_eq!(received.batch.original_quantity, 50);
        assert_eq!(received.batch.status, BatchStatus::Active);
        assert!(received.conflict_alert.is_none());
    }

    #[tokio::test]
    async fn test_receive_sequences_within_same_day() {
        let repo = MemoryBatchRepository::new();
        let service = ReceivingService::new(&repo);

        let mut new = input(12, 10);
        new.prod_date = Some(date(2026, 8, 24));
        service.receive(&new).await.expect("first");
        let second = service.receive(&new).await.expect("second");
        assert_eq!(second.batch.batch_number, "P12-20260824-002");
    }

    #[tokio::test]
    async fn test_receive_surfaces_conflict_but_still_creates() {
        let repo = MemoryBatchRepository::new();
        let mut existing = batch(1, 12, 10);
        existing.prod_date = Some(date(2026, 2, 1));
        repo.insert(existing);

        let service = ReceivingService::new(&repo);
        let mut new = input(12, 10);
        new.prod_date = Some(date(2026, 3, 1));

        let received = service.receive(&new).await.expect("receive");
        assert!(matches!(
            received.conflict_alert,
            Some(Alert::DateConflict { .. })
        ));
        // Advisory only: the batch exists regardless.
        let stored = repo
            .get_batch(received.batch.id)
            .await
            .expect("get")
            .expect("exists");
        assert_eq!(stored.quantity, 10);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_quantity_before_any_write() {
        let repo = MemoryBatchRepository::new();
        let service = ReceivingService::new(&repo);

        let err = service.receive(&input(12, 0)).await.expect_err("reject");
        assert!(matches!(
            err,
            InventoryError::Validation(ValidationError::NonPositiveQuantity(0))
        ));

        let listed = repo
            .list_batches(&crate::models::BatchFilter::default())
            .await
            .expect("list");
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_expiry_not_after_production() {
        let repo = MemoryBatchRepository::new();
        let service = ReceivingService::new(&repo);

        let mut new = input(12, 10);
        new.prod_date = Some(date(2026, 8, 24));
        new.exp_date = Some(date(2026, 8, 24));

        let err = service.receive(&new).await.expect_err("reject");
        assert!(matches!(
            err,
            InventoryError::Validation(ValidationError::ExpiryBeforeProduction { .. })
        ));
    }

    #[tokio::test]
    async fn test_rejects_negative_cost() {
        let repo = MemoryBatchRepository::new();
        let service = ReceivingService::new(&repo);

        let mut new = input(12, 10);
        new.cost_price = Some(Decimal::new(-1, 0));

        let err = service.receive(&new).await.expect_err("reject");
        assert!(matches!(
            err,
            InventoryError::Validation(ValidationError::NegativeCost(_))
        ));
    }

    #[tokio::test]
    async fn test_number_collision_falls_back_to_timestamp_number() {
        let repo = MemoryBatchRepository::new();
        // A gap in the sequence makes count-then-format collide: two
        // existing numbers, so the generator produces -003, which is taken.
        let mut first = batch(1, 12, 0);
        first.batch_number = "P12-20260824-001".to_string();
        repo.insert(first);
        let mut gapped = batch(2, 12, 0);
        gapped.batch_number = "P12-20260824-003".to_string();
        repo.insert(gapped);

        let service = ReceivingService::new(&repo);
        let mut new = input(12, 10);
        new.prod_date = Some(date(2026, 8, 24));

        let received = service.receive(&new).await.expect("receive");
        assert!(received.batch.batch_number.starts_with("P12-"));
        assert_ne!(received.batch.batch_number, "P12-20260824-003");
        // Fallback numbers have no date segment.
        assert_eq!(received.batch.batch_number.matches('-').count(), 1);
    }
}
