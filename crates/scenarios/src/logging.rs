//! Opt-in tracing output for scenario tests.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a fmt subscriber honoring `RUST_LOG`. Safe to call from every
/// test; only the first call wins.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Ignore error if already set by another test in the same binary.
    let _ = fmt().with_env_filter(env_filter).try_init();
}
