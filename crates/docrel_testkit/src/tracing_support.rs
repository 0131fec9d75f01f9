//! Tracing output for tests.

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber once per process.
///
/// Output is captured by the test harness and filtered by `RUST_LOG`
/// (default `docrel_core=debug`). Later calls do nothing.
pub fn init_test_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docrel_core=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
    tracing::trace!("test tracing installed");
}
