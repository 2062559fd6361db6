//! The smart proxy orchestrator (specification §4.1).
//!
//! Owns one namespace binding, exposes the two-operation `{discover,
//! execute}` surface, and routes between the lexical and vector backends,
//! downgrading to lexical for the remainder of the binding on any
//! embedding or vector-store failure.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use config::SmartProxyConfig;
use serde_json::Value;
use uuid::Uuid;

use crate::dynamic_limit;
use crate::embedding::{self, Candidate, EmbeddingClient, EmbeddingRepository};
use crate::error::Error;
use crate::lexical::{self, LexicalIndex};
use crate::tool::{BoundTool, ToolDescriptorView};
use crate::truncation;
use crate::vector_discovery;

/// Fixed description advertised for `execute`; unlike `discover` it is
/// never operator-overridable.
const EXECUTE_DESCRIPTION: &str =
    "Execute a tool found via discover. Provide the toolId and method returned by discover, plus the tool's arguments.";

const DEFAULT_DISCOVER_DESCRIPTION: &str =
    "Search the available tools by natural language query and return the best matches.";

/// One entry of the fixed two-tool catalogue advertised in smart mode.
#[derive(serde::Serialize)]
pub struct ToolCatalogueEntry {
    /// `"discover"` or `"execute"`.
    pub name: &'static str,
    /// Operator-overridable for `discover`, fixed for `execute`.
    pub description: String,
    /// JSON schema for the tool's arguments.
    pub input_schema: Value,
}

/// Collaborators needed for the vector search path. Absent when the
/// namespace has no `embedding` configuration, forcing lexical-only
/// operation even if `search_mode` is `embeddings`.
struct VectorCollaborators {
    client: EmbeddingClient,
    repository: EmbeddingRepository,
    namespace_uuid: Uuid,
    model_name: String,
}

/// An atomically-published snapshot of one namespace's bound tools.
///
/// `bind` is the only writer; `discover` and `execute` each read one
/// consistent snapshot for the duration of their call, never a mix of old
/// and new state (specification §5).
struct NamespaceState {
    tools: HashMap<String, BoundTool>,
    tools_by_uuid: HashMap<Uuid, BoundTool>,
    lexical: LexicalIndex,
}

impl NamespaceState {
    fn empty() -> Self {
        Self {
            tools: HashMap::new(),
            tools_by_uuid: HashMap::new(),
            lexical: LexicalIndex::empty(),
        }
    }
}

/// Owns one namespace's binding and serves `discover`/`execute` against it.
pub struct Orchestrator {
    config: SmartProxyConfig,
    state: ArcSwap<NamespaceState>,
    downgraded_to_lexical: AtomicBool,
    vector: Option<VectorCollaborators>,
}

impl Orchestrator {
    /// Builds an orchestrator with no tools bound yet, lexical-only until
    /// [`Self::with_vector_backend`] is applied.
    pub fn new(config: SmartProxyConfig) -> Self {
        Self {
            config,
            state: ArcSwap::from_pointee(NamespaceState::empty()),
            downgraded_to_lexical: AtomicBool::new(false),
            vector: None,
        }
    }

    /// Equips the orchestrator with the collaborators needed for vector
    /// discovery. Without this, `search_mode = embeddings` has no effect.
    pub fn with_vector_backend(mut self, client: EmbeddingClient, repository: EmbeddingRepository, namespace_uuid: Uuid) -> Self {
        let model_name = self
            .config
            .embedding
            .as_ref()
            .map(|e| e.model.clone())
            .unwrap_or_else(|| "BAAI/bge-m3".to_string());

        self.vector = Some(VectorCollaborators {
            client,
            repository,
            namespace_uuid,
            model_name,
        });

        self
    }

    /// Atomically replaces the bound tool set. Re-entrant calls fully
    /// supersede prior state. If the namespace is in vector mode and
    /// equipped with vector collaborators, reconciles persisted embeddings;
    /// reconciliation failures are logged and downgrade the session to
    /// lexical rather than propagating.
    pub async fn bind(&self, tools: Vec<BoundTool>) {
        log::debug!("binding {} tool(s)", tools.len());

        let mut by_unique_id = HashMap::with_capacity(tools.len());
        let mut by_uuid = HashMap::with_capacity(tools.len());
        let descriptors: Vec<_> = tools.iter().map(|t| t.descriptor.clone()).collect();

        for tool in tools {
            by_unique_id.insert(tool.descriptor.unique_id(), tool.clone());
            by_uuid.insert(tool.descriptor.tool_uuid, tool);
        }

        let lexical = match LexicalIndex::build(&descriptors, self.config.fuzzy, self.config.description_boost) {
            Ok(index) => index,
            Err(err) => {
                log::warn!("failed to build lexical index, falling back to an empty one: {err}");
                LexicalIndex::empty()
            }
        };

        self.state.store(std::sync::Arc::new(NamespaceState {
            tools: by_unique_id,
            tools_by_uuid: by_uuid,
            lexical,
        }));

        self.downgraded_to_lexical.store(false, Ordering::SeqCst);

        if self.config.search_mode == config::SearchMode::Embeddings {
            self.reconcile_embeddings(&descriptors).await;
        }
    }

    async fn reconcile_embeddings(&self, descriptors: &[crate::tool::ToolDescriptor]) {
        let Some(vector) = &self.vector else {
            return;
        };

        let candidates: Vec<Candidate> = descriptors
            .iter()
            .map(|tool| Candidate {
                tool_uuid: tool.tool_uuid,
                embedding_text: canonical_embedding_text(tool, &self.config),
            })
            .collect();

        let result = embedding::reconcile(
            &vector.client,
            &vector.repository,
            vector.namespace_uuid,
            &vector.model_name,
            &candidates,
        )
        .await;

        if let Err(err) = result {
            log::warn!("embedding reconciliation failed, downgrading to lexical search: {err}");
            self.downgraded_to_lexical.store(true, Ordering::SeqCst);
        }
    }

    /// Joins `queries` with a single space, searches the preferred backend,
    /// and returns a JSON-encoded array of descriptors. Always succeeds:
    /// embedding or vector-store failures fall through to lexical search,
    /// and an empty lexical index yields an empty array rather than an
    /// error.
    pub async fn discover(&self, queries: &[String]) -> String {
        let composite_query = queries.join(" ");
        let state = self.state.load();

        let descriptors = if self.should_try_vector() {
            match self.vector_discover(&state, &composite_query).await {
                Ok(descriptors) => descriptors,
                Err(err) => {
                    log::warn!("vector discovery failed, falling back to lexical search: {err}");
                    self.downgraded_to_lexical.store(true, Ordering::SeqCst);
                    self.lexical_discover(&state, &composite_query)
                }
            }
        } else {
            self.lexical_discover(&state, &composite_query)
        };

        serde_json::to_string(&descriptors).unwrap_or_else(|_| "[]".to_string())
    }

    fn should_try_vector(&self) -> bool {
        self.config.search_mode == config::SearchMode::Embeddings
            && self.vector.is_some()
            && !self.downgraded_to_lexical.load(Ordering::SeqCst)
    }

    async fn vector_discover(&self, state: &NamespaceState, composite_query: &str) -> Result<Vec<ToolDescriptorView>, Error> {
        let vector = self.vector.as_ref().expect("checked by should_try_vector");

        vector_discovery::discover(
            &vector.client,
            &vector.repository,
            vector.namespace_uuid,
            &vector.model_name,
            &state.tools_by_uuid,
            composite_query,
            &self.config.dynamic_limit,
        )
        .await
    }

    fn lexical_discover(&self, state: &NamespaceState, composite_query: &str) -> Vec<ToolDescriptorView> {
        let over_fetch = self.config.dynamic_limit.max_results * 2;

        let raw_results = match state.lexical.search(composite_query, over_fetch.max(1)) {
            Ok(results) => results,
            Err(err) => {
                log::warn!("lexical search failed: {err}");
                return Vec::new();
            }
        };

        let raw_scores: Vec<f32> = raw_results.iter().map(|(_, score)| *score).collect();
        let normalized = lexical::normalize(&raw_scores);
        let keep = dynamic_limit::select(&normalized, &self.config.dynamic_limit);

        raw_results
            .into_iter()
            .take(keep)
            .filter_map(|(unique_id, _)| state.tools.get(&unique_id).map(ToolDescriptorView::from))
            .collect()
    }

    /// Resolves `toolId::method` against the current snapshot and forwards
    /// the call to its owning connection. Fails with [`Error::ToolNotFound`]
    /// if the pair isn't bound.
    pub async fn execute(&self, tool_id: &str, method: &str, args: Value) -> Result<Value, Error> {
        let state = self.state.load();
        let unique_id = format!("{tool_id}::{method}");

        let Some(tool) = state.tools.get(&unique_id) else {
            log::debug!("execute: no bound tool for '{unique_id}'");
            return Err(Error::ToolNotFound {
                tool_id: tool_id.to_string(),
                method: method.to_string(),
            });
        };

        tool.connection.call_tool(method, args).await.map_err(Error::DownstreamCallError)
    }

    /// The fixed two-tool catalogue advertised to clients when smart mode
    /// is active.
    pub fn static_catalogue(&self) -> [ToolCatalogueEntry; 2] {
        let discover_description = self
            .config
            .discover_description
            .clone()
            .unwrap_or_else(|| DEFAULT_DISCOVER_DESCRIPTION.to_string());

        [
            ToolCatalogueEntry {
                name: "discover",
                description: discover_description,
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "queries": {"type": "array", "items": {"type": "string"}},
                    },
                    "required": ["queries"],
                }),
            },
            ToolCatalogueEntry {
                name: "execute",
                description: EXECUTE_DESCRIPTION.to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "toolId": {"type": "string"},
                        "method": {"type": "string"},
                        "args": {"type": "object"},
                    },
                    "required": ["toolId", "method", "args"],
                }),
            },
        ]
    }
}

/// The deterministic text submitted to the embedding model for `tool`
/// (specification §3): `"<method>: <truncated description>\nParameters: <parameterDescriptions>"`.
pub fn canonical_embedding_text(tool: &crate::tool::ToolDescriptor, config: &SmartProxyConfig) -> String {
    let description = if tool.description.is_empty() {
        "No description".to_string()
    } else {
        truncation::truncate(&tool.description, &config.truncation)
    };

    format!(
        "{}: {}\nParameters: {}",
        tool.original_name,
        description,
        tool.parameter_descriptions()
    )
}

#[cfg(test)]
mod tests {
    use config::SearchMode;

    use super::*;
    use crate::downstream::{ConnectionHandle, DownstreamConnection};
    use crate::tool::{ParameterDescriptor, ToolDescriptor};

    struct EchoConnection;

    #[async_trait::async_trait]
    impl DownstreamConnection for EchoConnection {
        async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
            Ok(serde_json::json!({"called": name, "with": arguments}))
        }
    }

    fn bound_tool(server: &str, method: &str, description: &str) -> BoundTool {
        BoundTool {
            descriptor: ToolDescriptor {
                server_name: server.to_string(),
                original_name: method.to_string(),
                description: description.to_string(),
                input_schema: serde_json::json!({"type": "object"}),
                parameters: vec![],
                tool_uuid: Uuid::new_v4(),
            },
            connection: ConnectionHandle::new(EchoConnection),
        }
    }

    #[tokio::test]
    async fn s1_smart_surface_shape_with_zero_tools() {
        let orchestrator = Orchestrator::new(SmartProxyConfig::default());
        orchestrator.bind(Vec::new()).await;

        let catalogue = orchestrator.static_catalogue();
        assert_eq!(catalogue[0].name, "discover");
        assert_eq!(catalogue[1].name, "execute");
        assert_eq!(catalogue[0].input_schema["required"][0], "queries");
    }

    #[tokio::test]
    async fn s2_lexical_happy_path() {
        let orchestrator = Orchestrator::new(SmartProxyConfig::default());

        orchestrator
            .bind(vec![
                bound_tool("weather", "get_forecast", "Returns the forecast for a city."),
                bound_tool("git", "commit", "Create a git commit."),
            ])
            .await;

        let result = orchestrator.discover(&["forecast".to_string()]).await;
        let parsed: Vec<ToolDescriptorView> = serde_json::from_str(&result).unwrap();

        assert_eq!(parsed[0].method, "get_forecast");
        assert_eq!(parsed[0].tool_id, "weather");
    }

    #[tokio::test]
    async fn empty_lexical_index_returns_empty_array_not_error() {
        let orchestrator = Orchestrator::new(SmartProxyConfig::default());
        orchestrator.bind(Vec::new()).await;

        let result = orchestrator.discover(&["anything".to_string()]).await;
        assert_eq!(result, "[]");
    }

    #[tokio::test]
    async fn s7_execute_unknown_tool_fails_with_hint() {
        let orchestrator = Orchestrator::new(SmartProxyConfig::default());
        orchestrator.bind(Vec::new()).await;

        let err = orchestrator.execute("nope", "nope", serde_json::json!({})).await.unwrap_err();
        let message = err.to_string();

        assert!(message.contains("nope"));
        assert!(message.contains("discover"));
    }

    #[tokio::test]
    async fn execute_forwards_to_the_owning_connection() {
        let orchestrator = Orchestrator::new(SmartProxyConfig::default());
        orchestrator.bind(vec![bound_tool("weather", "get_forecast", "desc")]).await;

        let result = orchestrator
            .execute("weather", "get_forecast", serde_json::json!({"city": "Berlin"}))
            .await
            .unwrap();

        assert_eq!(result["called"], "get_forecast");
    }

    #[tokio::test]
    async fn rebind_fully_supersedes_prior_state() {
        let orchestrator = Orchestrator::new(SmartProxyConfig::default());
        orchestrator.bind(vec![bound_tool("weather", "get_forecast", "desc")]).await;
        orchestrator.bind(vec![bound_tool("git", "commit", "desc")]).await;

        let err = orchestrator
            .execute("weather", "get_forecast", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));

        let result = orchestrator.execute("git", "commit", serde_json::json!({})).await;
        assert!(result.is_ok());
    }

    #[test]
    fn canonical_embedding_text_matches_s3() {
        let tool = ToolDescriptor {
            server_name: "demo".to_string(),
            original_name: "do_thing".to_string(),
            description: "A long paragraph.\n{schema: ...}".to_string(),
            input_schema: serde_json::json!({}),
            parameters: vec![],
            tool_uuid: Uuid::nil(),
        };

        let text = canonical_embedding_text(&tool, &SmartProxyConfig::default());
        assert_eq!(text, "do_thing: A long paragraph.\nParameters: none");
    }

    #[test]
    fn canonical_embedding_text_includes_parameters() {
        let tool = ToolDescriptor {
            server_name: "demo".to_string(),
            original_name: "do_thing".to_string(),
            description: "Short.".to_string(),
            input_schema: serde_json::json!({}),
            parameters: vec![ParameterDescriptor {
                name: "city".to_string(),
                description: Some("City name".to_string()),
            }],
            tool_uuid: Uuid::nil(),
        };

        let text = canonical_embedding_text(&tool, &SmartProxyConfig::default());
        assert_eq!(text, "do_thing: Short.\nParameters: City name");
    }

    #[test]
    fn canonical_embedding_text_empty_description() {
        let tool = ToolDescriptor {
            server_name: "demo".to_string(),
            original_name: "do_thing".to_string(),
            description: String::new(),
            input_schema: serde_json::json!({}),
            parameters: vec![],
            tool_uuid: Uuid::nil(),
        };

        let text = canonical_embedding_text(&tool, &SmartProxyConfig::default());
        assert_eq!(text, "do_thing: No description\nParameters: none");
    }

    #[test]
    fn search_mode_without_vector_backend_stays_lexical() {
        let mut config = SmartProxyConfig::default();
        config.search_mode = SearchMode::Embeddings;
        let orchestrator = Orchestrator::new(config);

        assert!(!orchestrator.should_try_vector());
    }
}
