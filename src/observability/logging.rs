//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Respect RUST_LOG over the configured default filter
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Idempotent init so tests and embedders can both call it

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber. Later calls are no-ops.
pub fn init(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
