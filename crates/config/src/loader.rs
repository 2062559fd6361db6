use std::path::Path;

use crate::{Config, Error};

/// Reads and parses a TOML file into a [`Config`].
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;

    for name in config.namespaces.keys() {
        log::debug!("loaded namespace configuration: {name}");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use indoc::indoc;

    use super::*;

    #[test]
    fn loads_minimal_file() {
        let mut file = tempfile_with(indoc! {r#"
            listenAddress = "0.0.0.0:9000"

            [namespaces.default]
            searchMode = "keyword"
        "#});

        let config = load(file.path()).unwrap();
        assert_eq!(config.listen_address, "0.0.0.0:9000");
        assert!(config.namespaces.contains_key("default"));

        file.flush().unwrap();
    }

    #[test]
    fn missing_file_is_config_open_error() {
        let err = load("/nonexistent/path/to/config.toml").unwrap_err();
        assert!(matches!(err, Error::ConfigOpen(_)));
    }

    #[test]
    fn malformed_toml_is_config_parse_error() {
        let file = tempfile_with("not = [valid");
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    fn tempfile_with(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }
}
