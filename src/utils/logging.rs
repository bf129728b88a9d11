//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter directives.
pub const LOG_ENV_VAR: &str = "CMDSHIFT_LOG";

/// Filter used when `CMDSHIFT_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "cmdshift_backend=info,cmdshift_llm=info";

/// Initialize the tracing/logging system.
///
/// Reads `CMDSHIFT_LOG` for per-module log levels.
/// Format: `CMDSHIFT_LOG=cmdshift_backend::services::generation=debug,cmdshift_llm=warn`
///
/// Calling it more than once is a no-op. If another subscriber was already
/// installed globally (tests, embedding), that one is kept.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
