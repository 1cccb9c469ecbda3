//! Structured logging setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, Environment};

/// Directives used when `RUST_LOG` is not set.
pub fn default_directives(config: &Config) -> String {
    let level = config.log_level.as_str();
    format!("todo_server={level},todo_core={level},tower_http={level},warn")
}

/// Install the global subscriber: JSON lines in prod, human-readable in dev.
pub fn init(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config)));

    let registry = tracing_subscriber::registry().with(filter);
    match config.environment {
        Environment::Prod => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        Environment::Dev => registry.with(fmt::layer().with_target(true)).init(),
    }
}
