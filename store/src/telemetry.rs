//! Tracing subscriber bootstrap for the binary.

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LogFormat;

/// Filter applied when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Error returned when a global subscriber is already installed.
pub type TelemetryError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Install the global subscriber, honouring `RUST_LOG`.
///
/// # Errors
///
/// Fails when a global subscriber has already been set.
pub fn init(format: LogFormat) -> Result<(), TelemetryError> {
    let builder = fmt().with_env_filter(env_filter());
    match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use env_lock::lock_env;
    use rstest::rstest;

    #[rstest]
    fn falls_back_to_default_filter() {
        let _guard = lock_env([("RUST_LOG", None::<String>)]);
        assert_eq!(env_filter().to_string(), DEFAULT_FILTER);
    }

    #[rstest]
    fn honours_rust_log() {
        let _guard = lock_env([("RUST_LOG", Some("causeway_store=debug".to_owned()))]);
        assert_eq!(env_filter().to_string(), "causeway_store=debug");
    }
}
