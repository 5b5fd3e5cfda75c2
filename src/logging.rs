//! Log output for the binary.

use anyhow::{anyhow, Result};
use toolbridge_types::BridgeConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies.
/// `verbose` forces `debug`.
pub fn init_logging(config: &BridgeConfig, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_new("debug")?
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("Failed to initialise logging: {}", err))
}
