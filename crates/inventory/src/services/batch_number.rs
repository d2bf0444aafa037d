//! Batch number generation for newly received stock.
//!
//! Numbers follow `P{product}-{YYYYMMDD}-{seq}` where the sequence is the
//! count of existing numbers under the same product/date prefix plus one.
//! Two concurrent receipts can read the same count and collide on the same
//! number; the store's unique index rejects the second insert, and the
//! receiving flow retries with a fresh count. When the store cannot be
//! queried at all, a timestamp fallback keeps receiving unblocked at the
//! price of a less readable number.

use chrono::{DateTime, NaiveDate, Utc};

use stockroom_core::ProductId;

use crate::db::BatchRepository;

/// Generates human-readable batch numbers.
pub struct BatchNumberGenerator<'a, R> {
    repo: &'a R,
}

impl<'a, R: BatchRepository> BatchNumberGenerator<'a, R> {
    /// Create a generator backed by the given repository.
    #[must_use]
    pub const fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Produce the next batch number for a product.
    ///
    /// Uses `prod_date` for the date component when given, otherwise today.
    /// Never fails: a store fault falls back to a timestamp-based number.
    pub async fn generate(&self, product_id: ProductId, prod_date: Option<NaiveDate>) -> String {
        let effective_date = prod_date.unwrap_or_else(|| Utc::now().date_naive());
        let prefix = number_prefix(product_id, effective_date);

        match self
            .repo
            .count_batches_with_prefix(product_id, &prefix)
            .await
        {
            Ok(count) => format!("{prefix}{:03}", count + 1),
            Err(err) => {
                let fallback = fallback_number(product_id, Utc::now());
                tracing::warn!(
                    product_id = %product_id,
                    error = %err,
                    fallback = %fallback,
                    "Batch number sequence unavailable, using timestamp fallback"
                );
                fallback
            }
        }
    }
}

/// Prefix shared by all batches of a product received under one date.
fn number_prefix(product_id: ProductId, date: NaiveDate) -> String {
    format!("P{product_id}-{}-", date.format("%Y%m%d"))
}

/// Timestamp-based fallback for when the sequence cannot be computed, or a
/// collision with a concurrent receipt needs breaking.
pub(crate) fn fallback_number(product_id: ProductId, now: DateTime<Utc>) -> String {
    format!("P{product_id}-{}", now.timestamp_millis())
}
