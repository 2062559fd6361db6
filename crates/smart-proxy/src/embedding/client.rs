//! Thin adapter to an OpenAI-compatible `/embeddings` endpoint (specification §4.7).

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::Error;

const MAX_BATCH: usize = 100;
const DEFAULT_DIMENSIONS: usize = 1024;

/// Credentials and target for an OpenAI-shaped embeddings endpoint.
pub struct EmbeddingClient {
    http: reqwest::Client,
    api_url: url::Url,
    api_key: SecretString,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    index: usize,
}

impl EmbeddingClient {
    /// Builds a client targeting `api_url` with model `model`, authenticating with `api_key`.
    pub fn new(http: reqwest::Client, api_url: url::Url, api_key: SecretString, model: String) -> Self {
        Self {
            http,
            api_url,
            api_key,
            model,
        }
    }

    /// Embeds every text in `texts` in a single request.
    ///
    /// Empty input returns an empty vector without making a request. More
    /// than 100 texts fails fast with [`Error::BatchTooLarge`] — the caller
    /// is responsible for chunking (specification §4.4 chunks in batches
    /// of 50).
    pub async fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if texts.len() > MAX_BATCH {
            return Err(Error::BatchTooLarge(texts.len()));
        }

        let endpoint = embeddings_endpoint(&self.api_url);
        let started_at = telemetry::now_utc();
        let started = std::time::Instant::now();

        let response = self
            .http
            .post(endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|err| Error::EmbeddingApiError {
                status: err.status().map(|s| s.as_u16()).unwrap_or(0),
                body: err.to_string(),
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(Error::EmbeddingApiError {
                status: status.as_u16(),
                body,
            });
        }

        let mut parsed: EmbeddingsResponse = response.json().await.map_err(|err| Error::EmbeddingApiError {
            status: status.as_u16(),
            body: err.to_string(),
        })?;

        log::debug!(
            "embedding request for {} text(s) started at {started_at} took {:?}",
            texts.len(),
            started.elapsed()
        );

        // The server is not required to preserve request order.
        parsed.data.sort_by_key(|datum| datum.index);

        Ok(parsed.data.into_iter().map(|datum| datum.embedding).collect())
    }

    /// Convenience wrapper over [`Self::generate_embeddings`] for a single text.
    pub async fn generate_single_embedding(&self, text: &str) -> Result<Vec<f32>, Error> {
        let mut vectors = self.generate_embeddings(std::slice::from_ref(&text.to_string())).await?;

        Ok(vectors.pop().unwrap_or_default())
    }

    /// Static dimension lookup for sanity-checking only; the authoritative
    /// dimension is always the length of the vector actually returned.
    pub fn model_dimensions(&self) -> usize {
        model_dimensions(&self.model)
    }
}

/// Builds `{baseUrl}/embeddings`, per specification §6. `Url::join` is
/// deliberately avoided here: its RFC 3986 relative-resolution semantics
/// replace the base URL's last path segment unless the base path ends in
/// `/`, which would silently drop a base path like `.../v1`.
fn embeddings_endpoint(api_url: &url::Url) -> String {
    format!("{}/embeddings", api_url.as_str().trim_end_matches('/'))
}

fn model_dimensions(model: &str) -> usize {
    match model {
        "BAAI/bge-m3" => 1024,
        "text-embedding-3-small" => 1536,
        "text-embedding-3-large" => 3072,
        _ => DEFAULT_DIMENSIONS,
    }
}

/// Cosine similarity between two equal-length vectors, exposed for
/// in-process fallback. Not used on the hot path when the vector store
/// performs the comparison itself.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_dimensions_known_model() {
        assert_eq!(model_dimensions("BAAI/bge-m3"), 1024);
    }

    #[test]
    fn model_dimensions_unknown_defaults() {
        assert_eq!(model_dimensions("some-future-model"), DEFAULT_DIMENSIONS);
    }

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_similarity_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
    }

    #[test]
    fn embeddings_endpoint_preserves_a_base_path_without_trailing_slash() {
        let api_url = url::Url::parse("https://api.example.com/v1").unwrap();
        assert_eq!(embeddings_endpoint(&api_url), "https://api.example.com/v1/embeddings");
    }

    #[test]
    fn embeddings_endpoint_tolerates_a_trailing_slash() {
        let api_url = url::Url::parse("https://api.example.com/v1/").unwrap();
        assert_eq!(embeddings_endpoint(&api_url), "https://api.example.com/v1/embeddings");
    }

    #[tokio::test]
    async fn empty_input_skips_the_request_entirely() {
        let client = EmbeddingClient::new(
            reqwest::Client::new(),
            url::Url::parse("http://localhost:1/v1/").unwrap(),
            SecretString::from("test-key".to_string()),
            "BAAI/bge-m3".to_string(),
        );

        let result = client.generate_embeddings(&[]).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn oversized_batch_fails_fast_without_a_request() {
        let client = EmbeddingClient::new(
            reqwest::Client::new(),
            url::Url::parse("http://localhost:1/v1/").unwrap(),
            SecretString::from("test-key".to_string()),
            "BAAI/bge-m3".to_string(),
        );

        let texts: Vec<String> = (0..101).map(|i| i.to_string()).collect();
        let err = client.generate_embeddings(&texts).await.unwrap_err();
        assert!(matches!(err, Error::BatchTooLarge(101)));
    }
}
