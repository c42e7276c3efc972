pub mod fixtures;
mod memory;

pub use memory::{MemorySession, MemoryStorage};

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-writer `fmt` subscriber once per process.
///
/// Respects `RUST_LOG`; defaults to debug for the datadef crates so generated SQL and
/// row counts show up in failing test output.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("datadef_data=debug,datadef_data_sqlx=debug"));
        // Another harness may already have installed a global subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
