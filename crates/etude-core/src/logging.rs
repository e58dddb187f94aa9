//! Tracing subscriber setup for Etude applications.
//!
//! Call one of the `init_logging*` functions once, before [`App::new`]
//! runs discovery, so unit loading is visible in the logs:
//!
//! ```rust,no_run
//! use etude_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let app = App::new().await?;
//!     app.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! The filter comes from `RUST_LOG` when set:
//!
//! ```bash
//! # Per-unit discovery output and per-request traces
//! RUST_LOG=etude_core=debug,tower_http=debug cargo run
//!
//! # Production
//! RUST_LOG=warn cargo run
//! ```
//!
//! [`App::new`]: crate::App::new

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    /// Multi-line output with line numbers and thread ids.
    Pretty,
    /// One JSON object per event, for log aggregation.
    Json,
}

/// Install the global subscriber, falling back to `default_level` when
/// `RUST_LOG` is unset or invalid. Fails if a subscriber is already set.
pub fn try_init(format: LogFormat, default_level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Compact => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_line_number(true)
                    .with_thread_ids(true)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
    }
}

/// Initialize logging at `info` unless `RUST_LOG` says otherwise.
///
/// A second call is ignored.
pub fn init_logging() {
    init_logging_with_level("info");
}

/// Initialize logging with a specific default level (`"trace"` .. `"error"`).
pub fn init_logging_with_level(level: &str) {
    let _ = try_init(LogFormat::Compact, level);
}

/// Pretty, multi-line logging for development.
pub fn init_logging_pretty() {
    let _ = try_init(LogFormat::Pretty, "info");
}

/// JSON logging for production.
pub fn init_logging_json() {
    let _ = try_init(LogFormat::Json, "info");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        let _ = try_init(LogFormat::Compact, "warn");
        assert!(try_init(LogFormat::Json, "warn").is_err());
        init_logging();
    }
}
