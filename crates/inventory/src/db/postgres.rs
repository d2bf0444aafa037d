//! Postgres-backed batch repository.
//!
//! Queries use the runtime-checked `sqlx::query_as` form with explicit row
//! structs; rows are mapped into domain types through `From` impls. The
//! schema lives in `migrations/` and is applied with `sqlx migrate`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use stockroom_core::{BatchId, BatchStatus, ProductId, SupplierId, SupplierOrderId};

use crate::models::{AllocationLine, Batch, BatchFilter, BatchUpdateResult, NewBatch};

use super::{BatchRepository, CommitError, ExpiringBatch, RepositoryError};

/// Internal row type for batch queries.
#[derive(Debug, sqlx::FromRow)]
struct BatchRow {
    id: i32,
    product_id: i32,
    batch_number: String,
    quantity: i32,
    original_quantity: i32,
    prod_date: Option<NaiveDate>,
    exp_date: Option<NaiveDate>,
    received_date: DateTime<Utc>,
    supplier_id: Option<i32>,
    supplier_order_id: Option<i32>,
    cost_price: Option<Decimal>,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BatchRow> for Batch {
    type Error = RepositoryError;

    fn try_from(row: BatchRow) -> Result<Self, Self::Error> {
        let status: BatchStatus = row
            .status
            .parse()
            .map_err(|_| RepositoryError::DataCorruption(format!(
                "batch {} has unknown status {:?}",
                row.id, row.status
            )))?;
        Ok(Self {
            id: BatchId::new(row.id),
            product_id: ProductId::new(row.product_id),
            batch_number: row.batch_number,
            quantity: row.quantity,
            original_quantity: row.original_quantity,
            prod_date: row.prod_date,
            exp_date: row.exp_date,
            received_date: row.received_date,
            supplier_id: row.supplier_id.map(SupplierId::new),
            supplier_order_id: row.supplier_order_id.map(SupplierOrderId::new),
            cost_price: row.cost_price,
            status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for expiry scan queries (batch + product name).
#[derive(Debug, sqlx::FromRow)]
struct ExpiringBatchRow {
    #[sqlx(flatten)]
    batch: BatchRow,
    product_name: Option<String>,
}

/// Internal row type for the locked read inside commit.
#[derive(Debug, sqlx::FromRow)]
struct LockedQuantityRow {
    quantity: i32,
}

const BATCH_COLUMNS: &str = "id, product_id, batch_number, quantity, original_quantity, \
     prod_date, exp_date, received_date, supplier_id, supplier_order_id, \
     cost_price, status, notes, created_at, updated_at";

/// Repository for batch database operations.
pub struct PgBatchRepository {
    pool: PgPool,
}

impl PgBatchRepository {
    /// Create a new Postgres batch repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BatchRepository for PgBatchRepository {
    async fn create_batch(&self, new: &NewBatch) -> Result<Batch, RepositoryError> {
        let sql = format!(
            "INSERT INTO batch (
                product_id, batch_number, quantity, original_quantity,
                prod_date, exp_date, supplier_id, supplier_order_id,
                cost_price, notes
            )
            VALUES ($1, $2, $3, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {BATCH_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(new.product_id.as_i32())
            .bind(&new.batch_number)
            .bind(new.quantity)
            .bind(new.prod_date)
            .bind(new.exp_date)
            .bind(new.supplier_id.map(|id| id.as_i32()))
            .bind(new.supplier_order_id.map(|id| id.as_i32()))
            .bind(new.cost_price)
            .bind(&new.notes)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("idx_batch_number_product_date")
                {
                    return RepositoryError::Conflict(
                        "Batch number already exists for this product".to_string(),
                    );
                }
                RepositoryError::Database(e)
            })?;

        row.try_into()
    }

    async fn get_batch(&self, id: BatchId) -> Result<Option<Batch>, RepositoryError> {
        let sql = format!("SELECT {BATCH_COLUMNS} FROM batch WHERE id = $1");
        let row = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_batches(&self, filter: &BatchFilter) -> Result<Vec<Batch>, RepositoryError> {
        let limit = filter.limit.unwrap_or(100);
        let offset = filter.offset.unwrap_or(0);

        let sql = format!(
            "SELECT {BATCH_COLUMNS}
            FROM batch
            WHERE
                ($1::int IS NULL OR product_id = $1)
                AND ($2::text IS NULL OR status = $2)
                AND ($3::timestamptz IS NULL OR received_date >= $3)
                AND ($4::timestamptz IS NULL OR received_date <= $4)
                AND ($5::bool IS NULL OR NOT $5 OR quantity > 0)
            ORDER BY received_date ASC, id ASC
            LIMIT $6 OFFSET $7"
        );
        let rows = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(filter.product_id.map(|id| id.as_i32()))
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.received_from)
            .bind(filter.received_to)
            .bind(filter.has_remaining)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn active_batches(&self, product_id: ProductId) -> Result<Vec<Batch>, RepositoryError> {
        let sql = format!(
            "SELECT {BATCH_COLUMNS}
            FROM batch
            WHERE product_id = $1 AND status = 'ACTIVE' AND quantity > 0
            ORDER BY prod_date ASC NULLS LAST, received_date ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(product_id.as_i32())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn count_batches_with_prefix(
        &self,
        product_id: ProductId,
        prefix: &str,
    ) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)
            FROM batch
            WHERE product_id = $1 AND batch_number LIKE $2 || '%'",
        )
        .bind(product_id.as_i32())
        .bind(prefix)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn expiring_batches(
        &self,
        today: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<ExpiringBatch>, RepositoryError> {
        let sql = format!(
            "SELECT {}, p.name AS product_name
            FROM batch b
            LEFT JOIN product p ON p.id = b.product_id
            WHERE b.status = 'ACTIVE'
                AND b.quantity > 0
                AND b.exp_date IS NOT NULL
                AND b.exp_date BETWEEN $1 AND $2
            ORDER BY b.exp_date ASC, b.id ASC",
            BATCH_COLUMNS
                .split(", ")
                .map(|c| format!("b.{c}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let rows = sqlx::query_as::<_, ExpiringBatchRow>(&sql)
            .bind(today)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ExpiringBatch {
                    batch: row.batch.try_into()?,
                    product_name: row.product_name,
                })
            })
            .collect()
    }

    async fn commit_allocation(
        &self,
        lines: &[AllocationLine],
    ) -> Result<Vec<BatchUpdateResult>, CommitError> {
        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(lines.len());

        for line in lines {
            if line.quantity <= 0 {
                return Err(CommitError::InvalidLine {
                    batch_id: line.batch_id,
                    quantity: line.quantity,
                });
            }

            // Row lock; concurrent commits against the same batch serialize here.
            let locked = sqlx::query_as::<_, LockedQuantityRow>(
                "SELECT quantity FROM batch WHERE id = $1 FOR UPDATE",
            )
            .bind(line.batch_id.as_i32())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CommitError::BatchMissing(line.batch_id))?;

            if line.quantity > locked.quantity {
                // Dropping the transaction rolls back every earlier update.
                return Err(CommitError::StalePlan {
                    batch_id: line.batch_id,
                    requested: line.quantity,
                    available: locked.quantity,
                });
            }

            let new_quantity = (locked.quantity - line.quantity).max(0);
            let status = if new_quantity == 0 {
                BatchStatus::Depleted
            } else {
                BatchStatus::Active
            };

            sqlx::query(
                "UPDATE batch SET quantity = $2, status = $3, updated_at = now() WHERE id = $1",
            )
            .bind(line.batch_id.as_i32())
            .bind(new_quantity)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

            results.push(BatchUpdateResult {
                batch_id: line.batch_id,
                previous_quantity: locked.quantity,
                new_quantity,
                status,
            });
        }

        tx.commit().await?;
        Ok(results)
    }

    async fn mark_expired(&self, id: BatchId) -> Result<Batch, RepositoryError> {
        let sql = format!(
            "UPDATE batch SET status = 'EXPIRED', updated_at = now()
            WHERE id = $1
            RETURNING {BATCH_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}
