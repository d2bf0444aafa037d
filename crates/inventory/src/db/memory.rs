//! In-memory batch repository.
//!
//! Backs unit and integration tests without a running Postgres, with the
//! same observable semantics as the production store: FIFO read ordering,
//! all-or-nothing commits, and stale-plan detection. A fault toggle lets
//! tests exercise the store-unavailable paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use stockroom_core::{BatchId, BatchStatus, ProductId};

use crate::models::{AllocationLine, Batch, BatchFilter, BatchUpdateResult, NewBatch};

use super::{BatchRepository, CommitError, ExpiringBatch, RepositoryError};

#[derive(Debug, Default)]
struct State {
    batches: BTreeMap<i32, Batch>,
    product_names: HashMap<i32, String>,
    next_id: i32,
}

/// In-memory implementation of [`BatchRepository`].
#[derive(Debug, Default)]
pub struct MemoryBatchRepository {
    state: Mutex<State>,
    unavailable: AtomicBool,
}

impl MemoryBatchRepository {
    /// Create an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `RepositoryError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Register a product display name for expiry-scan joins.
    pub fn set_product_name(&self, product_id: ProductId, name: impl Into<String>) {
        let mut state = self.state.lock().expect("repository state poisoned");
        state
            .product_names
            .insert(product_id.as_i32(), name.into());
    }

    /// Insert a fully specified batch, bypassing the receiving flow.
    ///
    /// Intended for tests that need explicit IDs, received dates, or
    /// non-`Active` statuses.
    pub fn insert(&self, batch: Batch) {
        let mut state = self.state.lock().expect("repository state poisoned");
        state.next_id = state.next_id.max(batch.id.as_i32());
        state.batches.insert(batch.id.as_i32(), batch);
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn fifo_key(batch: &Batch) -> (bool, Option<NaiveDate>, chrono::DateTime<Utc>, i32) {
        // nulls-last on prod_date, then received order, then id.
        (
            batch.prod_date.is_none(),
            batch.prod_date,
            batch.received_date,
            batch.id.as_i32(),
        )
    }
}

#[async_trait]
impl BatchRepository for MemoryBatchRepository {
    async fn create_batch(&self, new: &NewBatch) -> Result<Batch, RepositoryError> {
        self.check_available()?;
        let mut state = self.state.lock().expect("repository state poisoned");

        let duplicate = state.batches.values().any(|b| {
            b.product_id == new.product_id && b.batch_number == new.batch_number
        });
        if duplicate {
            return Err(RepositoryError::Conflict(
                "Batch number already exists for this product".to_string(),
            ));
        }

        state.next_id += 1;
        let now = Utc::now();
        let batch = Batch {
            id: BatchId::new(state.next_id),
            product_id: new.product_id,
            batch_number: new.batch_number.clone(),
            quantity: new.quantity,
            original_quantity: new.quantity,
            prod_date: new.prod_date,
            exp_date: new.exp_date,
            received_date: now,
            supplier_id: new.supplier_id,
            supplier_order_id: new.supplier_order_id,
            cost_price: new.cost_price,
            status: BatchStatus::Active,
            notes: new.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        state.batches.insert(batch.id.as_i32(), batch.clone());
        Ok(batch)
    }

    async fn get_batch(&self, id: BatchId) -> Result<Option<Batch>, RepositoryError> {
        self.check_available()?;
        let state = self.state.lock().expect("repository state poisoned");
        Ok(state.batches.get(&id.as_i32()).cloned())
    }

    async fn list_batches(&self, filter: &BatchFilter) -> Result<Vec<Batch>, RepositoryError> {
        self.check_available()?;
        let state = self.state.lock().expect("repository state poisoned");

        let mut batches: Vec<Batch> = state
            .batches
            .values()
            .filter(|b| filter.product_id.is_none_or(|p| b.product_id == p))
            .filter(|b| filter.status.is_none_or(|s| b.status == s))
            .filter(|b| filter.received_from.is_none_or(|t| b.received_date >= t))
            .filter(|b| filter.received_to.is_none_or(|t| b.received_date <= t))
            .filter(|b| !filter.has_remaining.unwrap_or(false) || b.quantity > 0)
            .cloned()
            .collect();
        batches.sort_by_key(|b| (b.received_date, b.id));

        let offset = usize::try_from(filter.offset.unwrap_or(0)).unwrap_or(0);
        let limit = usize::try_from(filter.limit.unwrap_or(100)).unwrap_or(usize::MAX);
        Ok(batches.into_iter().skip(offset).take(limit).collect())
    }

    async fn active_batches(&self, product_id: ProductId) -> Result<Vec<Batch>, RepositoryError> {
        self.check_available()?;
        let state = self.state.lock().expect("repository state poisoned");

        let mut batches: Vec<Batch> = state
            .batches
            .values()
            .filter(|b| {
                b.product_id == product_id && b.status == BatchStatus::Active && b.quantity > 0
            })
            .cloned()
            .collect();
        batches.sort_by_key(Self::fifo_key);
        Ok(batches)
    }

    async fn count_batches_with_prefix(
        &self,
        product_id: ProductId,
        prefix: &str,
    ) -> Result<i64, RepositoryError> {
        self.check_available()?;
        let state = self.state.lock().expect("repository state poisoned");

        let count = state
            .batches
            .values()
            .filter(|b| b.product_id == product_id && b.batch_number.starts_with(prefix))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn expiring_batches(
        &self,
        today: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ExpiringBatch>, RepositoryError> {
        self.check_available()?;
        let state = self.state.lock().expect("repository state poisoned");

        let mut rows: Vec<ExpiringBatch> = state
            .batches
            .values()
            .filter(|b| b.status == BatchStatus::Active && b.quantity > 0)
            .filter(|b| b.exp_date.is_some_and(|exp| exp >= today && exp <= until))
            .map(|b| ExpiringBatch {
                batch: b.clone(),
                product_name: state.product_names.get(&b.product_id.as_i32()).cloned(),
            })
            .collect();
        rows.sort_by_key(|row| (row.batch.exp_date, row.batch.id));
        Ok(rows)
    }

    async fn commit_allocation(
        &self,
        lines: &[AllocationLine],
    ) -> Result<Vec<BatchUpdateResult>, CommitError> {
        self.check_available()?;
        let mut state = self.state.lock().expect("repository state poisoned");

        // Validate every line before touching anything, so a stale or
        // corrupt plan leaves the store exactly as it was.
        for line in lines {
            if line.quantity <= 0 {
                return Err(CommitError::InvalidLine {
                    batch_id: line.batch_id,
                    quantity: line.quantity,
                });
            }
            let batch = state
                .batches
                .get(&line.batch_id.as_i32())
                .ok_or(CommitError::BatchMissing(line.batch_id))?;
            if line.quantity > batch.quantity {
                return Err(CommitError::StalePlan {
                    batch_id: line.batch_id,
                    requested: line.quantity,
                    available: batch.quantity,
                });
            }
        }

        let now = Utc::now();
        let mut results = Vec::with_capacity(lines.len());
        for line in lines {
            let batch = state
                .batches
                .get_mut(&line.batch_id.as_i32())
                .ok_or(CommitError::BatchMissing(line.batch_id))?;
            let previous_quantity = batch.quantity;
            batch.quantity = (batch.quantity - line.quantity).max(0);
            batch.status = if batch.quantity == 0 {
                BatchStatus::Depleted
            } else {
                BatchStatus::Active
            };
            batch.updated_at = now;
            results.push(BatchUpdateResult {
                batch_id: line.batch_id,
                previous_quantity,
                new_quantity: batch.quantity,
                status: batch.status,
            });
        }
        Ok(results)
    }

    async fn mark_expired(&self, id: BatchId) -> Result<Batch, RepositoryError> {
        self.check_available()?;
        let mut state = self.state.lock().expect("repository state poisoned");

        let batch = state
            .batches
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;
        batch.status = BatchStatus::Expired;
        batch.updated_at = Utc::now();
        Ok(batch.clone())
    }
}
