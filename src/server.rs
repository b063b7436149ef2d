//! JSON HTTP tool server.
//!
//! Exposes the same three tools as the stdio MCP bridge for clients that
//! prefer plain HTTP.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Status, version and whether cloud mode is enabled |
//! | `GET`  | `/tools/list` | Tool descriptors with parameter schemas |
//! | `POST` | `/tools/{name}` | Call a tool by name |
//!
//! Tool calls answer with the MCP result shape:
//!
//! ```json
//! { "content": [{ "type": "text", "text": "{\"found\":false,...}" }], "isError": false }
//! ```
//!
//! Argument and remote failures are reported inside the payload with status
//! `200`. An unknown tool name answers `404` with the error-flagged body.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::tools::{call_tool, Operation, ToolContext};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    ctx: Arc<ToolContext>,
}

/// Builds the router. Exposed separately from [`run_server`] so tests can
/// serve it on an ephemeral port.
pub fn router(ctx: ToolContext) -> Router {
    let state = AppState { ctx: Arc::new(ctx) };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .layer(cors)
        .with_state(state)
}

/// Binds to `[server].bind` and serves until the process is terminated.
pub async fn run_server(ctx: ToolContext) -> anyhow::Result<()> {
    let bind_addr = ctx.config().server.bind.clone();
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        addr = %bind_addr,
        cloud = ctx.cloud_enabled(),
        "FixHive HTTP server listening"
    );
    serve(listener, ctx).await
}

/// Serves on an already bound listener.
pub async fn serve(listener: TcpListener, ctx: ToolContext) -> anyhow::Result<()> {
    axum::serve(listener, router(ctx)).await?;
    Ok(())
}

// ============ GET /health ============

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    cloud_enabled: bool,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cloud_enabled: state.ctx.cloud_enabled(),
    })
}

// ============ GET /tools/list ============

/// One entry of `GET /tools/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: String,
    pub read_only: bool,
    pub parameters: serde_json::Value,
}

impl From<Operation> for ToolInfo {
    fn from(op: Operation) -> Self {
        Self {
            name: op.name(),
            description: op.description(),
            read_only: op.read_only(),
            parameters: op.parameters_schema(),
        }
    }
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

/// Descriptors for every tool, in listing order.
pub fn tool_infos() -> Vec<ToolInfo> {
    Operation::ALL.into_iter().map(ToolInfo::from).collect()
}

async fn handle_list_tools() -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: tool_infos(),
    })
}

// ============ POST /tools/{name} ============

/// Unified tool dispatch.
///
/// The body is read as raw bytes: an empty body counts as no arguments, and
/// a body that is not JSON is handed to the validator as a string so it is
/// rejected the same way as any other malformed argument object.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let args = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&body).into_owned())
        })
    };

    let response = call_tool(&state.ctx, &name, &args).await;
    let status = if response.is_error {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    (status, Json(response)).into_response()
}
