//! Engine services: the operations the surrounding application calls.
//!
//! Each service borrows a [`crate::db::BatchRepository`] implementation;
//! none of them owns process-wide state. Planning services are read-only;
//! only [`AllocationCommitter`] and the receiving flow write.

pub mod allocation;
pub mod batch_number;
pub mod conflict;
pub mod expiry;
pub mod receiving;

pub use allocation::{AllocationCommitter, FifoAllocator, NEAR_EXPIRY_WINDOW_DAYS};
pub use batch_number::BatchNumberGenerator;
pub use conflict::{ConflictCheck, ConflictDetector};
pub use expiry::ExpiryScanner;
pub use receiving::{ReceivedBatch, ReceivingService};
