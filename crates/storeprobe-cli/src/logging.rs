//! `tracing` subscriber setup.
//!
//! Logs go to stderr next to the progress output. `RUST_LOG` overrides the
//! level implied by `-q`/`-v`.

use crate::config::CliConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Filter from `RUST_LOG`, falling back to `default`
fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(config: &CliConfig) {
    let filter = filter(config.verbosity.log_filter());
    let layer = if config.json_logs {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_ansi(config.color.should_color())
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    };

    let _ = tracing_subscriber::registry().with(layer).try_init();
}
