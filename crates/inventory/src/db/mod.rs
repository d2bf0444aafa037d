//! Persistence contract and implementations for the batch store.
//!
//! The engine never touches a connection pool directly; every service takes
//! a [`BatchRepository`] implementation injected at construction time. Two
//! implementations ship with the crate:
//!
//! - [`PgBatchRepository`] - Postgres via sqlx, the production store
//! - [`MemoryBatchRepository`] - in-memory store for tests and local tooling
//!
//! # Commit atomicity
//!
//! [`BatchRepository::commit_allocation`] is the engine's serialization
//! point. Implementations must apply all lines inside one atomic unit,
//! re-validate `line.quantity <= batch.quantity` under a row lock (plans may
//! be stale by commit time), and roll back the whole commit when any line
//! fails. A stale plan fails with [`CommitError::StalePlan`], distinct from
//! a planning-time shortage, so callers know to re-plan rather than retry.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use stockroom_core::{BatchId, ProductId};

use crate::models::{AllocationLine, Batch, BatchFilter, BatchUpdateResult, NewBatch};

pub use memory::MemoryBatchRepository;
pub use postgres::PgBatchRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate batch number).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from applying an allocation plan.
#[derive(Debug, Error)]
pub enum CommitError {
    /// A line asked for more than the batch currently holds; the plan is
    /// stale and the caller must re-plan. Nothing was applied.
    #[error(
        "stale plan: batch {batch_id} holds {available} units, line requires {requested}"
    )]
    StalePlan {
        batch_id: BatchId,
        requested: i32,
        available: i32,
    },

    /// A line references a batch that no longer exists.
    #[error("stale plan: batch {0} not found")]
    BatchMissing(BatchId),

    /// A line carries a non-positive quantity. Planning rejects these, so a
    /// corrupt or hand-built plan is the only way here; committing one would
    /// inflate stock. Nothing was applied.
    #[error("invalid plan line: batch {batch_id} with quantity {quantity}")]
    InvalidLine { batch_id: BatchId, quantity: i32 },

    /// Underlying store failure; the transaction was rolled back.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CommitError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// A batch joined with product identity, as returned by the expiry scan.
#[derive(Debug, Clone)]
pub struct ExpiringBatch {
    /// The batch nearing expiry.
    pub batch: Batch,
    /// Product display name, when the catalog has one.
    pub product_name: Option<String>,
}

/// Persistence contract for the batch engine.
///
/// All reads used for planning are snapshot reads; only
/// [`commit_allocation`](Self::commit_allocation) and
/// [`mark_expired`](Self::mark_expired) mutate state.
#[async_trait]
pub trait BatchRepository: Send + Sync {
    /// Persist a new batch from the receiving flow.
    ///
    /// `quantity` becomes both the current and the original quantity; the
    /// batch starts `Active` with `received_date` defaulting to now.
    async fn create_batch(&self, new: &NewBatch) -> Result<Batch, RepositoryError>;

    /// Fetch a batch by ID.
    async fn get_batch(&self, id: BatchId) -> Result<Option<Batch>, RepositoryError>;

    /// List batches matching a filter, ordered by received date.
    async fn list_batches(&self, filter: &BatchFilter) -> Result<Vec<Batch>, RepositoryError>;

    /// All batches for a product with `status = Active` and `quantity > 0`,
    /// ordered by `(prod_date asc nulls last, received_date asc, id asc)`.
    async fn active_batches(&self, product_id: ProductId) -> Result<Vec<Batch>, RepositoryError>;

    /// Count batches for a product whose batch number starts with `prefix`.
    async fn count_batches_with_prefix(
        &self,
        product_id: ProductId,
        prefix: &str,
    ) -> Result<i64, RepositoryError>;

    /// Active batches with remaining quantity whose expiry date falls in
    /// `[today, until]` inclusive, ordered by expiry date ascending, joined
    /// with product identity.
    async fn expiring_batches(
        &self,
        today: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ExpiringBatch>, RepositoryError>;

    /// Atomically apply an allocation plan's lines.
    ///
    /// See the module docs for the required locking and re-validation
    /// semantics. On any error, no batch is left mutated.
    async fn commit_allocation(
        &self,
        lines: &[AllocationLine],
    ) -> Result<Vec<BatchUpdateResult>, CommitError>;

    /// Administratively flip a batch to `Expired`. Quantity is untouched.
    async fn mark_expired(&self, id: BatchId) -> Result<Batch, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
