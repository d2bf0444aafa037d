//! Stockroom Core - Shared types library.
//!
//! This crate provides common types used across all Stockroom components:
//! - `inventory` - The batch tracking and FIFO allocation engine
//! - `integration-tests` - End-to-end engine tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access. This
//! keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and batch status

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
