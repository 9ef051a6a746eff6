//! Tracing subscriber setup.
//!
//! `RUST_LOG`, when set, wins over the configured level.

use crate::config::{EngineConfig, LoggingConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Installs a global fmt subscriber filtered by `config.level`.
///
/// Returns `false` if a global subscriber was already installed; the
/// existing one is left untouched.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = filter(&config.level);
    let layer = fmt::layer().with_target(true).with_ansi(config.ansi);

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .is_ok()
}

/// Like [`init`], honoring `debug` from the full engine config.
pub fn init_from(config: &EngineConfig) -> bool {
    init(&LoggingConfig {
        level: config.log_directive().to_string(),
        ansi: config.logging.ansi,
    })
}

fn filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}
