//! Embedding generation and persistence (specification §4.4, §4.7).

pub mod client;
pub mod repository;

pub use client::{EmbeddingClient, cosine_similarity};
pub use repository::{EmbeddingRepository, EmbeddingRow, PendingEmbeddingText, SimilarTool};

use uuid::Uuid;

use crate::error::Error;

const RECONCILE_BATCH_SIZE: usize = 50;
const INTER_BATCH_PAUSE: std::time::Duration = std::time::Duration::from_millis(100);

/// A tool's canonical text as it stands right now, input to reconciliation.
pub struct Candidate {
    /// The tool this text belongs to.
    pub tool_uuid: Uuid,
    /// The canonical embedding text for the tool, per §3.
    pub embedding_text: String,
}

/// Reconciles persisted embeddings against `candidates` (specification
/// §4.4 steps 1-4).
///
/// Generates embeddings in batches of up to [`RECONCILE_BATCH_SIZE`],
/// pausing [`INTER_BATCH_PAUSE`] between requests, then upserts the
/// results. Only tools the repository reports as missing or stale incur
/// an embedding request at all.
pub async fn reconcile(
    client: &EmbeddingClient,
    repository: &EmbeddingRepository,
    namespace_uuid: Uuid,
    model_name: &str,
    candidates: &[Candidate],
) -> Result<(), Error> {
    let pending: Vec<PendingEmbeddingText> = candidates
        .iter()
        .map(|candidate| PendingEmbeddingText {
            tool_uuid: candidate.tool_uuid,
            embedding_text: candidate.embedding_text.clone(),
        })
        .collect();

    let stale = repository.tools_needing_embeddings(&pending, namespace_uuid, model_name).await?;

    if stale.is_empty() {
        return Ok(());
    }

    let stale: std::collections::HashSet<Uuid> = stale.into_iter().collect();
    let needing_embeddings: Vec<&Candidate> = candidates.iter().filter(|c| stale.contains(&c.tool_uuid)).collect();

    for (batch_index, batch) in needing_embeddings.chunks(RECONCILE_BATCH_SIZE).enumerate() {
        if batch_index > 0 {
            tokio::time::sleep(INTER_BATCH_PAUSE).await;
        }

        let texts: Vec<String> = batch.iter().map(|c| c.embedding_text.clone()).collect();
        let vectors = client.generate_embeddings(&texts).await?;

        let rows: Vec<EmbeddingRow> = batch
            .iter()
            .zip(vectors)
            .map(|(candidate, embedding)| EmbeddingRow {
                tool_uuid: candidate.tool_uuid,
                embedding,
                embedding_text: candidate.embedding_text.clone(),
            })
            .collect();

        repository.upsert(namespace_uuid, model_name, &rows).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_batch_size_matches_specification() {
        assert_eq!(RECONCILE_BATCH_SIZE, 50);
    }
}
