//! Stockroom Inventory - batch tracking and FIFO allocation engine.
//!
//! This crate owns the one subsystem of the warehouse application with real
//! invariants: discrete receipts of stock ("batches") with production and
//! expiry dates, advisory conflict detection on receipt, First-In-First-Out
//! allocation of outgoing quantities across batches, atomic commit of
//! allocation plans, and proactive expiry scanning.
//!
//! # Architecture
//!
//! - [`models`] - Domain types: [`models::Batch`], allocation plans, alerts
//! - [`db`] - The [`db::BatchRepository`] contract plus Postgres and
//!   in-memory implementations
//! - [`services`] - The engine components: batch number generation, conflict
//!   detection, FIFO planning, allocation commit, expiry scanning, and the
//!   receiving composition
//!
//! Planning ([`services::FifoAllocator::allocate`]) is read-only and
//! snapshot-based; the commit path is the serialization point and
//! re-validates quantities under row locks, so two callers planning against
//! the same product cannot both over-allocate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{InventoryError, ValidationError};
