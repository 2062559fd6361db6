use clap::Parser;

/// Command-line arguments for the smart proxy gateway binary.
#[derive(Debug, Parser)]
#[command(name = "gateway", version, about = "Smart proxy tool gateway")]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, short = 'c', env = "GATEWAY_CONFIG")]
    pub config: String,

    /// Overrides the `logFilter` key from the configuration file.
    #[arg(long, env = "GATEWAY_LOG")]
    pub log_filter: Option<String>,
}
