//! Smart proxy: collapses a namespace's bound tool catalogue behind a
//! two-operation `{discover, execute}` surface, backed by a fuzzy lexical
//! index and an optional pgvector similarity search.

mod downstream;
mod dynamic_limit;
mod embedding;
mod error;
mod lexical;
mod orchestrator;
mod tool;
mod truncation;
mod vector_discovery;

pub use downstream::{ConnectionHandle, DownstreamConnection, StaticDownstreamRegistry};
pub use embedding::{EmbeddingClient, EmbeddingRepository};
pub use error::Error;
pub use orchestrator::{Orchestrator, ToolCatalogueEntry, canonical_embedding_text};
pub use tool::{BoundTool, ParameterDescriptor, ToolDescriptor, ToolDescriptorView};
