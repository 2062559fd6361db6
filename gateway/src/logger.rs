//! Logger initialization for the gateway binary.

use crate::args::Args;

/// Initializes the global logger, preferring `--log-filter` over the
/// configuration file's `logFilter`.
pub fn init(args: &Args, config: &config::Config) -> anyhow::Result<()> {
    let filter = args.log_filter.as_deref().unwrap_or(&config.log_filter);
    telemetry::init(filter)
}
