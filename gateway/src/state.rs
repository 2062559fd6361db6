//! In-process application state for the demo HTTP surface.
//!
//! Namespace catalogues, downstream transports and the admin CRUD layer
//! that would normally populate them live outside this crate's scope;
//! this demo stands in with a [`smart_proxy::StaticDownstreamRegistry`]
//! and a connection that just echoes back whatever arguments it receives.

use std::collections::HashMap;

use config::Config;
use serde_json::Value;
use smart_proxy::{BoundTool, DownstreamConnection, EmbeddingClient, EmbeddingRepository, Orchestrator, ParameterDescriptor, StaticDownstreamRegistry, ToolDescriptor};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Stands in for a real stdio/HTTP/SSE transport: echoes the call back as
/// its result, so `discover`/`execute` can be exercised end to end
/// without a live downstream server.
struct DemoConnection;

#[async_trait::async_trait]
impl DownstreamConnection for DemoConnection {
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Ok(serde_json::json!({"tool": name, "echoedArgs": arguments}))
    }
}

/// One tool, as accepted by the demo `bind` endpoint. Mirrors
/// [`ToolDescriptor`] but in a wire-friendly shape; `toolUuid` is assigned
/// by this binary rather than an external catalogue store.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub server_name: String,
    pub original_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_input_schema")]
    pub input_schema: Value,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

fn default_input_schema() -> Value {
    serde_json::json!({"type": "object"})
}

/// A parameter within a [`ToolSpec`]'s schema.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    pub name: String,
    pub description: Option<String>,
}

struct NamespaceRuntime {
    orchestrator: Orchestrator,
    downstream: RwLock<StaticDownstreamRegistry>,
}

/// Shared state behind every route: one runtime per configured namespace.
pub struct AppState {
    namespaces: HashMap<String, NamespaceRuntime>,
}

impl AppState {
    /// Builds a runtime for every namespace in `config`, wiring a vector
    /// backend wherever `searchMode = embeddings` and both `postgresUrl`
    /// and the namespace's `embedding` block are present.
    pub async fn build(config: &Config) -> anyhow::Result<Self> {
        let mut namespaces = HashMap::with_capacity(config.namespaces.len());

        for (name, namespace_config) in &config.namespaces {
            let mut orchestrator = Orchestrator::new(namespace_config.clone());

            if namespace_config.search_mode == config::SearchMode::Embeddings {
                if let (Some(postgres_url), Some(embedding)) = (&config.postgres_url, &namespace_config.embedding) {
                    let pool = PgPoolOptions::new().connect(postgres_url).await?;
                    sqlx::migrate!("../crates/smart-proxy/migrations").run(&pool).await?;
                    let client = EmbeddingClient::new(reqwest::Client::new(), embedding.api_url.clone(), embedding.api_key.clone(), embedding.model.clone());
                    let repository = EmbeddingRepository::new(pool);
                    orchestrator = orchestrator.with_vector_backend(client, repository, Uuid::new_v4());
                } else {
                    log::warn!("namespace '{name}' is in embeddings mode but missing postgresUrl or embedding config; staying lexical-only");
                }
            }

            namespaces.insert(
                name.clone(),
                NamespaceRuntime {
                    orchestrator,
                    downstream: RwLock::new(StaticDownstreamRegistry::new()),
                },
            );
        }

        Ok(Self { namespaces })
    }

    fn runtime(&self, namespace: &str) -> Result<&NamespaceRuntime, crate::error::Error> {
        self.namespaces
            .get(namespace)
            .ok_or_else(|| crate::error::Error::NamespaceNotFound(namespace.to_string()))
    }

    /// The fixed `{discover, execute}` catalogue for `namespace`.
    pub fn static_catalogue(&self, namespace: &str) -> Result<Vec<smart_proxy::ToolCatalogueEntry>, crate::error::Error> {
        Ok(self.runtime(namespace)?.orchestrator.static_catalogue().into_iter().collect())
    }

    /// Registers a demo connection for each new server name in `specs` and
    /// rebinds the namespace's tool table to exactly `specs`.
    pub async fn bind(&self, namespace: &str, specs: Vec<ToolSpec>) -> Result<(), crate::error::Error> {
        let runtime = self.runtime(namespace)?;
        let mut downstream = runtime.downstream.write().await;

        let mut tools = Vec::with_capacity(specs.len());

        for spec in specs {
            if downstream.get(&spec.server_name).is_none() {
                downstream.register(spec.server_name.clone(), DemoConnection);
            }

            let connection = downstream.get(&spec.server_name).expect("just registered if missing");

            tools.push(BoundTool {
                descriptor: ToolDescriptor {
                    server_name: spec.server_name,
                    original_name: spec.original_name,
                    description: spec.description,
                    input_schema: spec.input_schema,
                    parameters: spec
                        .parameters
                        .into_iter()
                        .map(|p| ParameterDescriptor {
                            name: p.name,
                            description: p.description,
                        })
                        .collect(),
                    tool_uuid: Uuid::new_v4(),
                },
                connection,
            });
        }

        runtime.orchestrator.bind(tools).await;
        Ok(())
    }

    /// Runs `discover` for `namespace`, returning the JSON-encoded array
    /// of matching descriptors as text.
    pub async fn discover(&self, namespace: &str, queries: &[String]) -> Result<String, crate::error::Error> {
        Ok(self.runtime(namespace)?.orchestrator.discover(queries).await)
    }

    /// Runs `execute` for `namespace`.
    pub async fn execute(&self, namespace: &str, tool_id: &str, method: &str, args: Value) -> Result<Value, crate::error::Error> {
        Ok(self.runtime(namespace)?.orchestrator.execute(tool_id, method, args).await?)
    }
}
