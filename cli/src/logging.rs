//! Logging initialization: stderr for humans, plus an optional daily-rotated file.
//!
//! - **RUST_LOG**: filter, e.g. `storefront=debug`. Default: `warn` (`storefront=debug`
//!   with `-v`).
//! - **STOREFRONT_LOG_DIR**: when set, logs are also written (plain text, no ANSI) to
//!   `storefront.log.<date>` in that directory.
//!
//! Stdout is reserved for command output (settings JSON, purge report).

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_DIR_VAR: &str = "STOREFRONT_LOG_DIR";

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "warn,storefront=debug,cli=debug" } else { "warn" })
    })
}

/// Installs the global subscriber. Keep the returned guard alive until exit so the file
/// writer flushes.
pub fn init(verbose: bool) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter(verbose));

    match std::env::var(LOG_DIR_VAR).ok().filter(|d| !d.trim().is_empty()) {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(&dir, "storefront.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter(verbose));
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .try_init()?;
            tracing::debug!(dir = %dir, "logging to file");
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(stderr_layer).try_init()?;
            Ok(None)
        }
    }
}
