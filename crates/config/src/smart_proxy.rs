use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Search backend a namespace's smart proxy endpoint resolves `discover` queries through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
    /// In-memory fuzzy lexical index. Always available, never persisted.
    #[default]
    Keyword,
    /// pgvector-backed similarity search, with lexical fallback on failure.
    Embeddings,
}

/// Per-namespace smart proxy configuration (specification §6).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SmartProxyConfig {
    /// Which backend `discover` prefers.
    pub search_mode: SearchMode,
    /// Fuzzy edit-distance tolerance for the lexical backend, in `[0, 1]`.
    pub fuzzy: f32,
    /// Boost applied to the `description` field in the lexical index.
    pub description_boost: f32,
    /// Operator override for the `discover` tool's advertised description.
    pub discover_description: Option<String>,
    /// Deprecated upper bound, superseded by `dynamic_limit.max_results`.
    /// Parsed for backward compatibility; never consulted by the orchestrator.
    pub discover_limit: Option<usize>,
    /// Dynamic-limit selector tuning.
    pub dynamic_limit: DynamicLimitConfig,
    /// Embedding backend credentials. `None` forces lexical-only operation
    /// even when `search_mode` is `Embeddings`.
    pub embedding: Option<EmbeddingConfig>,
    /// Canonical-embedding-text truncation tuning.
    pub truncation: TruncationConfig,
}

impl Default for SmartProxyConfig {
    fn default() -> Self {
        Self {
            search_mode: SearchMode::default(),
            fuzzy: 0.2,
            description_boost: 2.0,
            discover_description: None,
            discover_limit: None,
            dynamic_limit: DynamicLimitConfig::default(),
            embedding: None,
            truncation: TruncationConfig::default(),
        }
    }
}

/// Tuning for the score-drop truncation rule shared by both search backends.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DynamicLimitConfig {
    /// Hard cap on the number of results returned.
    pub max_results: usize,
    /// Absolute floor a score must clear to be considered at all.
    pub min_score: f32,
    /// Relative score drop, from one result to the next, that stops accumulation.
    pub drop_threshold: f32,
}

impl Default for DynamicLimitConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            min_score: 0.3,
            drop_threshold: 0.30,
        }
    }
}

/// Credentials and model selection for the external embedding service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Bearer token sent to the embedding API.
    pub api_key: SecretString,
    /// Base URL of the OpenAI-shaped embeddings endpoint.
    pub api_url: Url,
    /// Model name; also used as part of the persisted embedding row's unique key.
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    "BAAI/bge-m3".to_string()
}

/// Tuning for the canonical-embedding-text truncation algorithm.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TruncationConfig {
    /// When `false`, canonical text is description-verbatim.
    pub enabled: bool,
    /// Delimiter scanned for truncation points.
    pub delimiter: String,
    /// Which occurrence of `delimiter` to attempt truncating at first.
    pub occurrence: usize,
    /// Minimum accepted prefix length; shorter prefixes are skipped.
    pub min_length: usize,
}

impl Default for TruncationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delimiter: "\n".to_string(),
            occurrence: 1,
            min_length: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_specification() {
        let config = SmartProxyConfig::default();

        assert_eq!(config.search_mode, SearchMode::Keyword);
        assert_eq!(config.fuzzy, 0.2);
        assert_eq!(config.description_boost, 2.0);
        assert_eq!(config.dynamic_limit.max_results, 10);
        assert_eq!(config.dynamic_limit.min_score, 0.3);
        assert_eq!(config.dynamic_limit.drop_threshold, 0.30);
        assert!(config.truncation.enabled);
        assert_eq!(config.truncation.delimiter, "\n");
        assert_eq!(config.truncation.occurrence, 1);
        assert_eq!(config.truncation.min_length, 5);
        assert!(config.embedding.is_none());
    }

    #[test]
    fn parses_minimal_embeddings_config() {
        let toml = r#"
            searchMode = "embeddings"

            [embedding]
            apiKey = "secret"
            apiUrl = "https://api.example.com/v1"
        "#;

        let config: SmartProxyConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.search_mode, SearchMode::Embeddings);
        let embedding = config.embedding.expect("embedding config present");
        assert_eq!(embedding.model, "BAAI/bge-m3");
        assert_eq!(embedding.api_url.as_str(), "https://api.example.com/v1");
    }
}
