//! Operational alerts raised by the batch engine.
//!
//! Alerts are informational payloads attached to otherwise-successful
//! results; none of them blocks the operation that produced it. Shortages
//! (`NoStock`, `InsufficientStock`) accompany a plan with
//! `can_fulfill = false` and are expected outcomes, not errors.

use chrono::NaiveDate;
use serde::Serialize;

use stockroom_core::{BatchId, ProductId};

/// How urgently an alert should be surfaced to an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// Dates and remaining quantity of an existing batch, as carried inside a
/// [`Alert::DateConflict`] payload.
#[derive(Debug, Clone, Serialize)]
pub struct BatchDates {
    pub batch_id: BatchId,
    pub batch_number: String,
    pub quantity: i32,
    pub prod_date: Option<NaiveDate>,
    pub exp_date: Option<NaiveDate>,
}

/// A closed set of alert kinds, each carrying a strongly typed payload.
///
/// The `type` tag serializes as the SCREAMING_SNAKE_CASE kind name, so API
/// consumers see `{"type": "NEAR_EXPIRY", ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Alert {
    /// No active batches exist for the product at all.
    NoStock { product_id: ProductId },
    /// Active batches exist but sum to less than the required quantity.
    InsufficientStock {
        product_id: ProductId,
        required: i32,
        available: i64,
    },
    /// The plan spans batches with differing date cohorts; the picker must
    /// follow FIFO order across physically distinct stock.
    MultipleBatches {
        batch_count: usize,
        batch_numbers: Vec<String>,
    },
    /// A consumed batch expires within the near-expiry window.
    NearExpiry {
        batch_id: BatchId,
        batch_number: String,
        exp_date: NaiveDate,
        days_until_expiry: i64,
        quantity: i32,
    },
    /// A consumed batch is already past its expiry date. Such batches should
    /// not appear in an active set; this signals a data-hygiene fault in the
    /// surrounding system.
    ExpiredStock {
        batch_id: BatchId,
        batch_number: String,
        exp_date: NaiveDate,
        days_until_expiry: i64,
    },
    /// The dates on a proposed receipt differ from at least one existing
    /// active batch of the same product. Advisory only; never blocks receipt.
    DateConflict {
        product_id: ProductId,
        prod_date: Option<NaiveDate>,
        exp_date: Option<NaiveDate>,
        existing: Vec<BatchDates>,
    },
    /// The store could not be reached or a query failed mid-operation.
    SystemError { message: String },
}

impl Alert {
    /// Severity bucket for display and notification routing.
    #[must_use]
    pub const fn severity(&self) -> AlertSeverity {
        match self {
            Self::MultipleBatches { .. } => AlertSeverity::Info,
            Self::NearExpiry { .. } | Self::DateConflict { .. } => AlertSeverity::Warning,
            Self::NoStock { .. }
            | Self::InsufficientStock { .. }
            | Self::ExpiredStock { .. }
            | Self::SystemError { .. } => AlertSeverity::Critical,
        }
    }

    /// Wire tag for the alert kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoStock { .. } => "NO_STOCK",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::MultipleBatches { .. } => "MULTIPLE_BATCHES",
            Self::NearExpiry { .. } => "NEAR_EXPIRY",
            Self::ExpiredStock { .. } => "EXPIRED_STOCK",
            Self::DateConflict { .. } => "DATE_CONFLICT",
            Self::SystemError { .. } => "SYSTEM_ERROR",
        }
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoStock { product_id } => {
                write!(f, "No active stock for product {product_id}")
            }
            Self::InsufficientStock {
                product_id,
                required,
                available,
            } => write!(
                f,
                "Insufficient stock for product {product_id}: required {required}, available {available}"
            ),
            Self::MultipleBatches {
                batch_count,
                batch_numbers,
            } => write!(
                f,
                "Allocation spans {batch_count} batches ({}); pick in listed order",
                batch_numbers.join(", ")
            ),
            Self::NearExpiry {
                batch_number,
                exp_date,
                days_until_expiry,
                ..
            } => write!(
                f,
                "Batch {batch_number} expires on {exp_date} ({days_until_expiry} days)"
            ),
            Self::ExpiredStock {
                batch_number,
                exp_date,
                ..
            } => write!(f, "Batch {batch_number} expired on {exp_date}"),
            Self::DateConflict {
                product_id,
                existing,
                ..
            } => write!(
                f,
                "Dates on new receipt for product {product_id} differ from {} existing batch(es)",
                existing.len()
            ),
            Self::SystemError { message } => write!(f, "System error: {message}"),
        }
    }
}
