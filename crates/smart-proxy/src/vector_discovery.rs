//! Vector similarity discovery (specification §4.5).

use std::collections::HashMap;

use uuid::Uuid;

use crate::dynamic_limit::{self, DynamicLimitConfig};
use crate::embedding::{EmbeddingClient, EmbeddingRepository};
use crate::error::Error;
use crate::tool::{BoundTool, ToolDescriptorView};

/// A vector discovery hit, still carrying its similarity score. Stripped
/// down to a [`ToolDescriptorView`] before being returned to the client.
struct ScoredDescriptor {
    view: ToolDescriptorView,
    score: f32,
}

/// Runs the vector discovery path for `composite_query` against `tools`,
/// returning descriptors already reduced through the dynamic-limit
/// selector, in similarity order.
///
/// Any tool the store returns a similarity for but that is no longer
/// bound is dropped and logged — a benign race between unbind and a
/// reconciliation that hasn't caught up yet.
pub async fn discover(
    client: &EmbeddingClient,
    repository: &EmbeddingRepository,
    namespace_uuid: Uuid,
    model_name: &str,
    tools_by_uuid: &HashMap<Uuid, BoundTool>,
    composite_query: &str,
    dynamic_limit: &DynamicLimitConfig,
) -> Result<Vec<ToolDescriptorView>, Error> {
    let query_vector = client.generate_single_embedding(composite_query).await?;

    let over_fetch_limit = (dynamic_limit.max_results * 2) as i64;
    let hits = repository
        .find_similar(namespace_uuid, model_name, &query_vector, over_fetch_limit)
        .await?;

    let mut scored = Vec::with_capacity(hits.len());

    for hit in hits {
        let Some(tool) = tools_by_uuid.get(&hit.tool_uuid) else {
            log::debug!("dropping vector discovery hit for unbound tool {}", hit.tool_uuid);
            continue;
        };

        scored.push(ScoredDescriptor {
            view: ToolDescriptorView::from(tool),
            score: hit.similarity,
        });
    }

    let scores: Vec<f32> = scored.iter().map(|s| s.score).collect();
    let keep = dynamic_limit::select(&scores, dynamic_limit);

    Ok(scored.into_iter().take(keep).map(|s| s.view).collect())
}
