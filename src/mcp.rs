//! MCP protocol bridge.
//!
//! Adapts the closed [`Operation`] set to rmcp's [`ServerHandler`] so MCP
//! clients (Claude, Cursor, OpenCode) can list and call the FixHive tools
//! over stdio.
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "fixhive": { "command": "fixhive", "args": ["serve", "stdio"] }
//!   }
//! }
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::transport::stdio;
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt};

use crate::tools::{call_tool, Operation, ToolContext, ToolResponse};

/// Shares one [`ToolContext`] across every MCP session.
#[derive(Clone)]
pub struct FixHiveBridge {
    ctx: Arc<ToolContext>,
}

impl FixHiveBridge {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    /// Convert an operation into an rmcp `Tool` descriptor.
    fn to_mcp_tool(op: Operation) -> Tool {
        let input_schema = match op.parameters_schema() {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::new()),
        };

        Tool {
            name: Cow::Borrowed(op.name()),
            title: None,
            description: Some(Cow::Owned(op.description())),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(op.read_only())),
            execution: None,
            icons: None,
            meta: None,
        }
    }

    fn to_call_result(response: ToolResponse) -> CallToolResult {
        let content = response
            .content
            .into_iter()
            .map(|block| Content::text(block.text))
            .collect();
        if response.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

impl ServerHandler for FixHiveBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "fixhive".to_string(),
                title: Some("FixHive".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "FixHive is a shared knowledge base of error solutions. When you hit an error, \
                 normalize it and call fixhive_search_cases. After fixing it, call \
                 fixhive_report_resolution; use fixhive_vote to rate solutions you tried."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = Operation::ALL.into_iter().map(Self::to_mcp_tool).collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        Operation::from_name(name).map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let args = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Null);

        let response = call_tool(&self.ctx, &request.name, &args).await;
        Ok(Self::to_call_result(response))
    }
}

/// Serves the bridge on stdin/stdout until the client disconnects.
pub async fn serve_stdio(ctx: ToolContext) -> anyhow::Result<()> {
    tracing::info!(
        cloud = ctx.cloud_enabled(),
        version = env!("CARGO_PKG_VERSION"),
        "Starting FixHive MCP server on stdio"
    );

    let server = FixHiveBridge::new(ctx).serve(stdio()).await?;
    server.waiting().await?;

    tracing::info!("FixHive MCP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use fixhive_core::client::scripted::ScriptedClient;

    fn bridge() -> FixHiveBridge {
        FixHiveBridge::new(ToolContext::new(
            Arc::new(Config::default()),
            Arc::new(ScriptedClient::new()),
        ))
    }

    #[test]
    fn descriptors_mark_search_read_only() {
        let search = bridge().get_tool("fixhive_search_cases").unwrap();
        assert_eq!(search.annotations.and_then(|a| a.read_only_hint), Some(true));
        let vote = bridge().get_tool("fixhive_vote").unwrap();
        assert_eq!(vote.annotations.and_then(|a| a.read_only_hint), Some(false));
        assert!(bridge().get_tool("search").is_none());
    }

    #[test]
    fn info_names_the_server() {
        let info = bridge().get_info();
        assert_eq!(info.server_info.name, "fixhive");
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn unknown_tool_maps_to_error_result() {
        let ctx = ToolContext::new(
            Arc::new(Config::default()),
            Arc::new(ScriptedClient::new()),
        );
        let response = call_tool(&ctx, "nope", &serde_json::Value::Null).await;
        let result = FixHiveBridge::to_call_result(response);
        assert_eq!(result.is_error, Some(true));
    }
}
