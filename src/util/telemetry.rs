//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/telemetry. Users can install their own subscriber; this
/// helper installs a default env-based subscriber if none is set.
pub fn init_tracing() {
    init_tracing_with(EnvFilter::from_default_env());
}

/// Like [`init_tracing`], with a directive string used when `RUST_LOG` is unset
/// (e.g. `"prometheus_task_executor=debug"`).
pub fn init_tracing_with_default(directives: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    init_tracing_with(filter);
}

fn init_tracing_with(filter: EnvFilter) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
