//! Domain models for the batch inventory engine.

pub mod alert;
pub mod allocation;
pub mod batch;

pub use alert::{Alert, AlertSeverity, BatchDates};
pub use allocation::{
    AllocationLine, AllocationPlan, BatchUpdateResult, ExpiryAlertEntry, ExpiryUrgency,
};
pub use batch::{Batch, BatchFilter, NewBatch, ReceiveBatchInput};
