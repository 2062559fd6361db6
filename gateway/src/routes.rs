//! HTTP routes exposing the smart proxy core as plain JSON endpoints.
//!
//! This is a thin demo adapter, not the outward-facing streaming tool
//! protocol endpoint (explicitly out of scope): it exists so the core can
//! be exercised over HTTP without a real MCP-speaking client.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::state::{AppState, ToolSpec};

/// Builds the router: `/namespaces/:namespace/{tools,bind,discover,execute}`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/namespaces/{namespace}/tools", get(get_tools))
        .route("/namespaces/{namespace}/bind", post(bind))
        .route("/namespaces/{namespace}/discover", post(discover))
        .route("/namespaces/{namespace}/execute", post(execute))
        .with_state(state)
}

async fn get_tools(State(state): State<Arc<AppState>>, Path(namespace): Path<String>) -> Result<Json<Vec<serde_json::Value>>, Error> {
    let catalogue = state.static_catalogue(&namespace)?;

    let entries = catalogue
        .into_iter()
        .map(|entry| serde_json::json!({"name": entry.name, "description": entry.description, "inputSchema": entry.input_schema}))
        .collect();

    Ok(Json(entries))
}

async fn bind(State(state): State<Arc<AppState>>, Path(namespace): Path<String>, Json(specs): Json<Vec<ToolSpec>>) -> Result<(), Error> {
    state.bind(&namespace, specs).await
}

#[derive(Deserialize)]
struct DiscoverRequest {
    queries: Vec<String>,
}

#[derive(Serialize)]
struct DiscoverContentBlock {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

#[derive(Serialize)]
struct DiscoverResponse {
    content: Vec<DiscoverContentBlock>,
}

async fn discover(State(state): State<Arc<AppState>>, Path(namespace): Path<String>, Json(request): Json<DiscoverRequest>) -> Result<Json<DiscoverResponse>, Error> {
    let text = state.discover(&namespace, &request.queries).await?;

    Ok(Json(DiscoverResponse {
        content: vec![DiscoverContentBlock { kind: "text", text }],
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteRequest {
    tool_id: String,
    method: String,
    args: Value,
}

async fn execute(State(state): State<Arc<AppState>>, Path(namespace): Path<String>, Json(request): Json<ExecuteRequest>) -> Result<Json<Value>, Error> {
    let result = state.execute(&namespace, &request.tool_id, &request.method, request.args).await?;
    Ok(Json(result))
}
