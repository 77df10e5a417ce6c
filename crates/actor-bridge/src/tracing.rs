/// Initializes the tracing/logging infrastructure for binaries and tests.
///
/// Structured logging via the `tracing` crate, filtered through the
/// `RUST_LOG` environment variable:
/// - `RUST_LOG=info` - lifecycle events and request outcomes
/// - `RUST_LOG=debug` - per-request flow, including payload tags
/// - `RUST_LOG=actor_bridge=debug` - debug only for the bridge
///
/// # Example
///
/// ```ignore
/// setup_tracing();
/// tracing::info!("Application started");
/// ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
