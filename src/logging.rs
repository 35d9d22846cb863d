// Initialize the tracing subscriber for binaries and test suites that want
// the harness's events on stderr. Honors RUST_LOG; a no-op once any global
// subscriber is installed.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let installed = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(target: "viash_harness", "tracing initialized");
    }
}
