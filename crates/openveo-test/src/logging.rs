//! Tracing subscriber setup for test runs.
//!
//! Page objects, fields and helpers log every action through `tracing`
//! (`debug!` for element level work, `info!` for page level steps). Test
//! binaries call [`init`] once to see those events; `RUST_LOG` takes
//! precedence over the default filter.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "openveo_test=info";

/// Output format of the subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines on stderr
    #[default]
    Pretty,
    /// One JSON object per event on stderr
    Json,
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed, which happens when
/// several tests of the same binary initialise logging.
pub fn init(format: LogFormat) -> bool {
    init_with_filter(format, DEFAULT_FILTER)
}

/// Install the global subscriber with an explicit default filter
pub fn init_with_filter(format: LogFormat, default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let layer = match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init().is_ok()
}
