//! HTTP surface for the language tools.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /tools/{name}` – Run a tool with a JSON object of arguments and return its
//!   `{ isError, content: { type, text } }` envelope. Unknown or disabled tools answer `404`.
//! - `GET /tools` – Machine-readable tool catalog (name, title, description, input schema).
//! - `GET /metrics` – Observe job counters.
//!
//! The HTTP surface shares the same tool service with the MCP server, so behavior is identical
//! across interfaces.

use crate::mcp::{ResponseEnvelope, ToolName};
use crate::service::ToolApi;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rmcp::model::JsonObject;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;

/// Build the HTTP router exposing the tool API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: ToolApi + 'static,
{
    Router::new()
        .route("/tools", get(list_tools))
        .route("/tools/:name", post(call_tool::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .with_state(service)
}

/// Run one tool. Tool faults are reported inside the envelope with `200 OK`.
async fn call_tool<S>(
    State(service): State<Arc<S>>,
    Path(name): Path<String>,
    arguments: Option<Json<JsonObject>>,
) -> Result<Json<ResponseEnvelope>, AppError>
where
    S: ToolApi,
{
    let tool: ToolName = name
        .parse()
        .map_err(|_| AppError::UnknownTool(name.clone()))?;
    let envelope = service
        .call_tool(
            tool,
            arguments.map(|Json(arguments)| arguments),
            CancellationToken::new(),
        )
        .await;
    tracing::info!(tool = %tool, is_error = envelope.is_error, "HTTP tool call completed");
    Ok(Json(envelope))
}

/// Descriptor for a single tool in the discovery catalog.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDescriptor {
    name: &'static str,
    title: &'static str,
    description: &'static str,
    path: String,
    input_schema: Map<String, Value>,
}

/// Response body for `GET /tools`.
#[derive(Serialize)]
struct ToolsResponse {
    tools: Vec<ToolDescriptor>,
}

/// Enumerate the tools for discovery by hosts and scripts.
async fn list_tools() -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: ToolName::iter()
            .map(|tool| ToolDescriptor {
                name: tool.as_str(),
                title: tool.title(),
                description: tool.description(),
                path: format!("/tools/{tool}"),
                input_schema: tool.input_schema(),
            })
            .collect(),
    })
}

/// Return the job counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<Value>
where
    S: ToolApi,
{
    Json(json!(service.metrics_snapshot()))
}

enum AppError {
    UnknownTool(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::UnknownTool(name) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("Unknown tool: {name}") })),
            )
                .into_response(),
        }
    }
}
