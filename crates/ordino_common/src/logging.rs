//! Logging utilities for the Ordino application.
//!
//! This module provides a standardized approach to logging across all crates
//! in the workspace. It includes functions for initializing the tracing
//! subscriber at application start.

use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber with the default log level (INFO).
///
/// This function should be called once at the start of the application.
/// Log messages are formatted with timestamps, levels, targets and
/// file/line information; `RUST_LOG` directives are honored on top of the
/// default level.
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level.
pub fn init_with_level(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Use try_init to handle the case where a global default subscriber has
    // already been set (tests, embedded use).
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// A log-safe prefix of a device token. Full tokens are credentials and
/// never appear in log output. The cut lands on a char boundary, so a
/// multi-byte token cannot panic the log call.
pub fn token_prefix(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(16)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    &token[..end]
}
