//! Persisted embedding storage against a pgvector-enabled Postgres database
//! (specification §4.4).
//!
//! `sqlx` has no native vector column type, so vectors are bound as
//! `$N::vector` string literals (`[0.1,0.2,...]`) the same way the rest of
//! the ecosystem works around the gap.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::Error;

/// One embedding ready to be upserted.
pub struct EmbeddingRow {
    /// The tool this embedding belongs to.
    pub tool_uuid: Uuid,
    /// The embedding vector, whose length becomes `embedding_dimensions`.
    pub embedding: Vec<f32>,
    /// The exact text submitted to the embedding model to produce `embedding`.
    pub embedding_text: String,
}

/// A similarity search hit.
pub struct SimilarTool {
    /// The matched tool.
    pub tool_uuid: Uuid,
    /// The embedding text stored for this tool, returned for diagnostics.
    pub embedding_text: String,
    /// `1 - cosine_distance`, in `[-1, 1]` in theory and `(0, 1]` in practice.
    pub similarity: f32,
}

/// A tool's canonical text as submitted for reconciliation, prior to
/// knowing whether it needs a fresh embedding.
pub struct PendingEmbeddingText {
    /// The tool this text belongs to.
    pub tool_uuid: Uuid,
    /// The canonical embedding text derived from the bound tool.
    pub embedding_text: String,
}

/// The embedding repository: upsert, similarity query, staleness check,
/// and scoped deletions against `tool_embeddings`.
pub struct EmbeddingRepository {
    pool: PgPool,
}

impl EmbeddingRepository {
    /// Wraps an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or updates `rows` for `(namespace_uuid, model_name)`.
    ///
    /// Conflicts on `(tool_uuid, namespace_uuid, model_name)` update
    /// `embedding`, `embedding_text`, `embedding_dimensions` and `updated_at`.
    pub async fn upsert(&self, namespace_uuid: Uuid, model_name: &str, rows: &[EmbeddingRow]) -> Result<(), Error> {
        for row in rows {
            let literal = format_embedding(&row.embedding);

            sqlx::query(
                r#"
                INSERT INTO tool_embeddings
                    (uuid, tool_uuid, namespace_uuid, model_name, embedding_dimensions, embedding, embedding_text, created_at, updated_at)
                VALUES
                    (gen_random_uuid(), $1, $2, $3, $4, $5::vector, $6, now(), now())
                ON CONFLICT (tool_uuid, namespace_uuid, model_name) DO UPDATE SET
                    embedding = EXCLUDED.embedding,
                    embedding_text = EXCLUDED.embedding_text,
                    embedding_dimensions = EXCLUDED.embedding_dimensions,
                    updated_at = now()
                "#,
            )
            .bind(row.tool_uuid)
            .bind(namespace_uuid)
            .bind(model_name)
            .bind(row.embedding.len() as i32)
            .bind(literal)
            .bind(&row.embedding_text)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    /// Orders candidates by ascending cosine distance to `query_vector`,
    /// returning the top `limit` as `(tool_uuid, embedding_text, similarity)`.
    /// Ties are broken by the database's implementation-defined order.
    pub async fn find_similar(
        &self,
        namespace_uuid: Uuid,
        model_name: &str,
        query_vector: &[f32],
        limit: i64,
    ) -> Result<Vec<SimilarTool>, Error> {
        let literal = format_embedding(query_vector);

        let rows = sqlx::query(
            r#"
            SELECT
                tool_uuid,
                embedding_text,
                1 - (embedding <=> $1::vector) AS similarity
            FROM tool_embeddings
            WHERE namespace_uuid = $2 AND model_name = $3
            ORDER BY embedding <=> $1::vector
            LIMIT $4
            "#,
        )
        .bind(literal)
        .bind(namespace_uuid)
        .bind(model_name)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SimilarTool {
                tool_uuid: row.get("tool_uuid"),
                embedding_text: row.get("embedding_text"),
                similarity: row.get::<f32, _>("similarity"),
            })
            .collect())
    }

    /// Returns the subset of `requested` with no stored row, or whose
    /// stored `embedding_text` differs byte-for-byte from the requested one.
    pub async fn tools_needing_embeddings(
        &self,
        requested: &[PendingEmbeddingText],
        namespace_uuid: Uuid,
        model_name: &str,
    ) -> Result<Vec<Uuid>, Error> {
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        let tool_uuids: Vec<Uuid> = requested.iter().map(|r| r.tool_uuid).collect();

        let rows = sqlx::query(
            r#"
            SELECT tool_uuid, embedding_text
            FROM tool_embeddings
            WHERE namespace_uuid = $1 AND model_name = $2 AND tool_uuid = ANY($3)
            "#,
        )
        .bind(namespace_uuid)
        .bind(model_name)
        .bind(&tool_uuids)
        .fetch_all(&self.pool)
        .await?;

        let stored: std::collections::HashMap<Uuid, String> =
            rows.into_iter().map(|row| (row.get("tool_uuid"), row.get("embedding_text"))).collect();

        Ok(requested
            .iter()
            .filter(|candidate| stored.get(&candidate.tool_uuid) != Some(&candidate.embedding_text))
            .map(|candidate| candidate.tool_uuid)
            .collect())
    }

    /// Deletes every row for the given tool uuids, regardless of namespace or model.
    pub async fn delete_by_tool_uuids(&self, tool_uuids: &[Uuid]) -> Result<u64, Error> {
        if tool_uuids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM tool_embeddings WHERE tool_uuid = ANY($1)")
            .bind(tool_uuids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every row for `namespace_uuid`, optionally scoped to one model.
    pub async fn delete_by_namespace(&self, namespace_uuid: Uuid, model_name: Option<&str>) -> Result<u64, Error> {
        let result = match model_name {
            Some(model_name) => {
                sqlx::query("DELETE FROM tool_embeddings WHERE namespace_uuid = $1 AND model_name = $2")
                    .bind(namespace_uuid)
                    .bind(model_name)
                    .execute(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("DELETE FROM tool_embeddings WHERE namespace_uuid = $1")
                    .bind(namespace_uuid)
                    .execute(&self.pool)
                    .await?
            }
        };

        Ok(result.rows_affected())
    }

    /// Deletes the row, if any, for one tool within one namespace.
    pub async fn delete_by_tool_and_namespace(&self, tool_uuid: Uuid, namespace_uuid: Uuid) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM tool_embeddings WHERE tool_uuid = $1 AND namespace_uuid = $2")
            .bind(tool_uuid)
            .bind(namespace_uuid)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Counts rows stored for `namespace_uuid`.
    pub async fn count_by_namespace(&self, namespace_uuid: Uuid) -> Result<i64, Error> {
        let row = sqlx::query("SELECT count(*) AS count FROM tool_embeddings WHERE namespace_uuid = $1")
            .bind(namespace_uuid)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("count"))
    }

    /// Whether a row exists for the exact `(tool_uuid, namespace_uuid, model_name)` tuple.
    pub async fn exists(&self, tool_uuid: Uuid, namespace_uuid: Uuid, model_name: &str) -> Result<bool, Error> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM tool_embeddings WHERE tool_uuid = $1 AND namespace_uuid = $2 AND model_name = $3) AS present",
        )
        .bind(tool_uuid)
        .bind(namespace_uuid)
        .bind(model_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("present"))
    }
}

/// Formats a vector as the `[v1,v2,...]` string literal pgvector expects
/// when bound through a plain text parameter and cast with `::vector`.
fn format_embedding(embedding: &[f32]) -> String {
    format!("[{}]", embedding.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_embedding_renders_bracketed_csv() {
        assert_eq!(format_embedding(&[0.1, 0.2, 0.3]), "[0.1,0.2,0.3]");
    }

    #[test]
    fn format_embedding_of_empty_vector() {
        assert_eq!(format_embedding(&[]), "[]");
    }
}
