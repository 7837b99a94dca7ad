//! `tracing` subscriber setup of the command line tool.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Installs a stderr subscriber.
///
/// `RUST_LOG` wins over `default_directive`, so
/// `RUST_LOG=ad_invalid_chars=debug` narrows output to this crate.
///
/// # Errors
/// [`TryInitError`] if a global subscriber is already installed.
#[inline]
pub fn init(default_directive: &str) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish()
        .try_init()
}
