/// Errors produced by the smart proxy orchestrator and its collaborators.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// `execute` was called with a `(toolId, method)` pair that isn't bound.
    #[error("Tool '{tool_id}::{method}' was not found. Call discover to find available tools.")]
    ToolNotFound {
        /// The requested `toolId`.
        tool_id: String,
        /// The requested method name.
        method: String,
    },
    /// The embedding service returned a non-2xx response, or the request failed outright.
    #[error("Embedding API error ({status}): {body}")]
    EmbeddingApiError {
        /// HTTP status code, or 0 if the request never reached the server.
        status: u16,
        /// Response body, or the transport error's message.
        body: String,
    },
    /// More texts were submitted to the embedding client than it accepts in a single call.
    #[error("Batch of {0} texts exceeds the embedding client's ceiling of 100")]
    BatchTooLarge(usize),
    /// A persistence error from the vector store.
    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] sqlx::Error),
    /// An error propagated verbatim from a downstream tool connection.
    #[error("Downstream call failed: {0}")]
    DownstreamCallError(#[source] Box<dyn std::error::Error + Send + Sync>),
}
