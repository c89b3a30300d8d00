use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Directives used when `RUST_LOG` is unset. Keeps sqlx statement logs quiet.
pub const DEFAULT_DIRECTIVES: &str = "info,sqlx=warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Initialize structured logging for the medicine tracker.
///
/// Call once from `main` before anything else logs.
pub fn init_logging() {
    fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .compact()
        .init();

    info!(
        "Logging initialized (RUST_LOG unset falls back to \"{}\")",
        DEFAULT_DIRECTIVES
    );
}
