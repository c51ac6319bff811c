//! Logging setup.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`. Fails if the level is not a
/// valid filter directive or a subscriber is already installed.
pub fn init(log_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)?,
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}
