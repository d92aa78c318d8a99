//! Shared fixtures for the integration tests and benchmarks.

pub mod ir;

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber once per test binary. Honors `RUST_LOG`,
/// defaults to `warn`.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
}
