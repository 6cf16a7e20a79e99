//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Filter comes from `SYNQ_LOG`, then `RUST_LOG`, defaulting to `info`.
//! Logs go to stderr so the wrapped command's stdout stays clean.

use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SYNQ_LOG";

pub fn init_logging() {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|s| EnvFilter::try_new(s).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new("%H:%M:%S".to_string()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
