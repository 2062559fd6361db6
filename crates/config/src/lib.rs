//! Configuration structures mapping the smart proxy gateway's TOML config.

#![deny(missing_docs)]

mod error;
mod loader;
mod smart_proxy;

use std::{collections::BTreeMap, path::Path};

pub use error::Error;
use serde::Deserialize;
pub use smart_proxy::{DynamicLimitConfig, EmbeddingConfig, SearchMode, SmartProxyConfig, TruncationConfig};

/// Top-level configuration for the smart proxy gateway.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address the demo `gateway` binary listens on.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// `log` filter directive string, e.g. `"info"` or `"smart_proxy=debug"`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Postgres connection string backing the embedding repository. Required
    /// only by namespaces whose `searchMode` is `embeddings`.
    pub postgres_url: Option<String>,
    /// Namespaces, keyed by name. Each owns an independent tool table,
    /// lexical index, and (if configured) embedding collaborator.
    pub namespaces: BTreeMap<String, SmartProxyConfig>,
}

fn default_listen_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        loader::load(path)
    }
}
