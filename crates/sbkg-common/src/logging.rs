//! Structured logging setup, shared by every binary entry point.

use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the global tracing subscriber. Honors `LOG_LEVEL`
/// (`DEBUG`/`INFO`/`WARN`/`ERROR`, §6.4) falling back to `RUST_LOG`, then
/// `info`.
pub fn init() {
    let filter = std::env::var("LOG_LEVEL")
        .ok()
        .map(|lvl| lvl.to_lowercase())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    let _ = fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .try_init();
}
