#![forbid(unsafe_code)]

//! Optional fmt subscriber for hosts without their own `tracing` setup.
//!
//! The filter is read from `DFORM_LOG` using `EnvFilter` syntax
//! (`DFORM_LOG=dform_runtime=debug`), falling back to `warn`.

use std::fmt;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "DFORM_LOG";

const DEFAULT_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    /// A global tracing subscriber is already installed.
    SubscriberAlreadySet,
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscriberAlreadySet => {
                write!(f, "a global tracing subscriber is already set")
            }
        }
    }
}

impl std::error::Error for LoggingError {}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a global fmt subscriber filtered by `DFORM_LOG`.
///
/// # Errors
///
/// [`LoggingError::SubscriberAlreadySet`] if any global subscriber exists,
/// including one installed by an earlier call.
pub fn init_logging() -> Result<(), LoggingError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}
