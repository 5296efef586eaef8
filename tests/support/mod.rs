#![allow(dead_code)]

pub mod auditable_books;
pub mod books;

use tracing_subscriber::EnvFilter;

/// Route repository tracing to the test harness. Set `RUST_LOG=polydoc=debug`
/// to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
