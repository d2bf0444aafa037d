//! Batch domain models for tracking dated receipts of stock.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{BatchId, BatchStatus, ProductId, SupplierId, SupplierOrderId};

/// A batch - a discrete, dated receipt of stock for one product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Unique batch ID.
    pub id: BatchId,
    /// Product this batch belongs to.
    pub product_id: ProductId,
    /// Human-readable batch number, e.g. `P12-20260824-001`.
    pub batch_number: String,
    /// Units currently remaining.
    pub quantity: i32,
    /// Units as received; `quantity` never exceeds this.
    pub original_quantity: i32,
    /// Production date, if known.
    pub prod_date: Option<NaiveDate>,
    /// Expiry date, if known.
    pub exp_date: Option<NaiveDate>,
    /// When the batch entered the store.
    pub received_date: DateTime<Utc>,
    /// Supplier the stock came from.
    pub supplier_id: Option<SupplierId>,
    /// Supplier order that delivered the stock.
    pub supplier_order_id: Option<SupplierOrderId>,
    /// Cost per unit for this specific receipt.
    pub cost_price: Option<Decimal>,
    /// Lifecycle status.
    pub status: BatchStatus,
    /// Free-form annotation, no semantic effect.
    pub notes: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// Days until this batch expires relative to `today`.
    ///
    /// Negative when already past expiry, `None` when the batch carries no
    /// expiry date.
    #[must_use]
    pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.exp_date.map(|exp| (exp - today).num_days())
    }
}

/// Input accepted by the receiving flow.
///
/// The batch number is not part of the input; it is generated by the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiveBatchInput {
    /// Product being received.
    pub product_id: ProductId,
    /// Units received.
    pub quantity: i32,
    /// Production date, if known.
    pub prod_date: Option<NaiveDate>,
    /// Expiry date, if known.
    pub exp_date: Option<NaiveDate>,
    /// Supplier the stock came from.
    pub supplier_id: Option<SupplierId>,
    /// Supplier order that delivered the stock.
    pub supplier_order_id: Option<SupplierOrderId>,
    /// Cost per unit for this receipt.
    pub cost_price: Option<Decimal>,
    /// Optional notes.
    pub notes: Option<String>,
}

/// A fully resolved new batch, ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewBatch {
    /// Product being received.
    pub product_id: ProductId,
    /// Generated batch number.
    pub batch_number: String,
    /// Units received; becomes both `quantity` and `original_quantity`.
    pub quantity: i32,
    /// Production date, if known.
    pub prod_date: Option<NaiveDate>,
    /// Expiry date, if known.
    pub exp_date: Option<NaiveDate>,
    /// Supplier the stock came from.
    pub supplier_id: Option<SupplierId>,
    /// Supplier order that delivered the stock.
    pub supplier_order_id: Option<SupplierOrderId>,
    /// Cost per unit for this receipt.
    pub cost_price: Option<Decimal>,
    /// Optional notes.
    pub notes: Option<String>,
}

/// Filter criteria for listing batches.
#[derive(Debug, Clone, Default)]
pub struct BatchFilter {
    /// Filter by product ID.
    pub product_id: Option<ProductId>,
    /// Filter by status.
    pub status: Option<BatchStatus>,
    /// Filter by received date (inclusive lower bound).
    pub received_from: Option<DateTime<Utc>>,
    /// Filter by received date (inclusive upper bound).
    pub received_to: Option<DateTime<Utc>>,
    /// Only batches with `quantity > 0`.
    pub has_remaining: Option<bool>,
    /// Maximum number of results.
    pub limit: Option<i64>,
    /// Number of results to skip.
    pub offset: Option<i64>,
}
