/// Errors produced while loading or validating a [`crate::Config`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to open configuration file: {0}")]
    ConfigOpen(#[from] std::io::Error),
    #[error("Failed to parse configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Namespace '{0}' has no downstream tools configured")]
    EmptyNamespace(String),
}
