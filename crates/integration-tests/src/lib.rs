//! Shared helpers for Stockroom integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialise tracing once for the whole test binary. Respects `RUST_LOG`.
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}
