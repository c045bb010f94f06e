#![allow(dead_code)]

use tracing_subscriber::EnvFilter;

/// Route library events to the test output; `RUST_LOG=oncecache=debug` shows them
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Value every test computes for `key`
pub fn value_for(key: &str) -> String {
    format!("{key}000")
}
