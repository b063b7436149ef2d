//! Tool dispatch.
//!
//! FixHive exposes a closed set of three tools. Each [`Operation`] pairs an
//! argument parser from [`crate::schema`] with a handler in this module tree,
//! and [`call_tool`] is the single entry point shared by the MCP bridge and the
//! HTTP server.
//!
//! Every handler returns a JSON payload. Validation failures, offline mode and
//! remote failures are all reported inside the payload; the response's
//! `is_error` flag is reserved for unknown tool names.

mod report;
mod search;
mod vote;

use std::sync::Arc;

use fixhive_core::client::KnowledgeClient;
use fixhive_core::signature::NORMALIZATION_GUIDE;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::ValidationError;
use crate::remote::create_client;

pub use report::ReportResponse;
pub use search::{SearchResponse, SearchResult, SolutionView};
pub use vote::VoteResponse;

/// Returned by every operation while cloud mode is disabled.
pub const OFFLINE_MESSAGE: &str =
    "Cloud mode is disabled. Set FIXHIVE_SUPABASE_URL and FIXHIVE_SUPABASE_KEY to enable.";

/// The tools this server knows about, in listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    Report,
    Vote,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Search, Operation::Report, Operation::Vote];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::Search => "fixhive_search_cases",
            Operation::Report => "fixhive_report_resolution",
            Operation::Vote => "fixhive_vote",
        }
    }

    pub fn description(self) -> String {
        match self {
            Operation::Search => format!(
                "Search the FixHive knowledge base for error solutions.\n\n\
                 IMPORTANT: Before calling this tool, normalize the error message:\n{}\n\n\
                 Returns ranked solutions based on similarity, environment match, and community votes.",
                NORMALIZATION_GUIDE
            ),
            Operation::Report => format!(
                "Report how an error was resolved so other developers can benefit.\n\n\
                 Call this after fixing an error, whether or not a FixHive solution was used. \
                 Pass used_variant_id when an existing solution worked.\n\n\
                 The error_signature must be normalized:\n{}\n\n\
                 Sensitive data (keys, tokens, emails, local paths) is redacted before upload.",
                NORMALIZATION_GUIDE
            ),
            Operation::Vote => "Vote on a FixHive solution variant.\n\n\
                 - up: the solution was helpful\n\
                 - down: the solution was not helpful or is outdated\n\
                 - report: the content is wrong, harmful or spam (reason required)"
                .to_string(),
        }
    }

    /// JSON Schema for the tool's arguments.
    pub fn parameters_schema(self) -> Value {
        let environment = json!({
            "language": {
                "type": "string",
                "description": "Programming language (typescript, python, php, etc.)"
            },
            "framework": {
                "type": "string",
                "description": "Framework (react, nextjs, laravel, django, etc.)"
            },
            "packages": {
                "type": "object",
                "description": "Key dependencies with versions (e.g., {\"react\": \"18.2.0\", \"next\": \"14.0.0\"})",
                "additionalProperties": { "type": "string" }
            }
        });

        let mut schema = match self {
            Operation::Search => json!({
                "type": "object",
                "properties": {
                    "error_message": {
                        "type": "string",
                        "description": "The original error message"
                    },
                    "error_signature": {
                        "type": "string",
                        "description": "Normalized error signature (with placeholders like {class}, {file}, {id})"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 20,
                        "default": 5,
                        "description": "Maximum number of results (default: 5)"
                    }
                },
                "required": ["error_message"]
            }),
            Operation::Report => json!({
                "type": "object",
                "properties": {
                    "error_message": { "type": "string", "description": "The original error message" },
                    "error_signature": {
                        "type": "string",
                        "minLength": 5,
                        "description": "Normalized error signature (with placeholders like {class}, {file}, {id})"
                    },
                    "stack_trace": { "type": "string", "description": "Stack trace, if available" },
                    "cause": { "type": "string", "description": "Root cause of the error" },
                    "solution": { "type": "string", "description": "How the error was fixed" },
                    "solution_steps": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Step-by-step fix instructions"
                    },
                    "code_diff": { "type": "string", "description": "Code change that fixed the error" },
                    "solved": {
                        "type": "boolean",
                        "default": true,
                        "description": "Whether the error was actually solved"
                    },
                    "used_variant_id": {
                        "type": "string",
                        "format": "uuid",
                        "description": "ID of the existing solution that worked, if any"
                    },
                    "what_was_tried": { "type": "string", "description": "Approaches that did not work" },
                    "time_spent": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "Minutes spent resolving the error"
                    }
                },
                "required": ["error_message", "error_signature"]
            }),
            Operation::Vote => json!({
                "type": "object",
                "properties": {
                    "variant_id": {
                        "type": "string",
                        "format": "uuid",
                        "description": "ID of the solution variant"
                    },
                    "value": {
                        "type": "string",
                        "enum": ["up", "down", "report"],
                        "description": "Vote value"
                    },
                    "reason": {
                        "type": "string",
                        "description": "Reason for the vote (required for report)"
                    }
                },
                "required": ["variant_id", "value"]
            }),
        };

        if self != Operation::Vote {
            if let (Some(props), Value::Object(env)) =
                (schema["properties"].as_object_mut(), environment)
            {
                props.extend(env);
            }
        }
        schema
    }

    /// Only search leaves the knowledge base unchanged.
    pub fn read_only(self) -> bool {
        matches!(self, Operation::Search)
    }

    /// Validates `args` and runs the handler. Never fails: every outcome is
    /// a JSON payload.
    pub async fn invoke(self, args: &Value, ctx: &ToolContext) -> Value {
        tracing::debug!(tool = self.name(), "Dispatching tool call");
        match self {
            Operation::Search => match crate::schema::parse_search(args) {
                Ok(input) => to_value(&search::handle(input, ctx).await),
                Err(e) => invalid(self, e),
            },
            Operation::Report => match crate::schema::parse_report(args) {
                Ok(input) => to_value(&report::handle(input, ctx).await),
                Err(e) => invalid(self, e),
            },
            Operation::Vote => match crate::schema::parse_vote(args) {
                Ok(input) => to_value(&vote::handle(input, ctx).await),
                Err(e) => invalid(self, e),
            },
        }
    }
}

/// What a handler needs: the frozen configuration and the remote client.
#[derive(Clone)]
pub struct ToolContext {
    config: Arc<Config>,
    client: Arc<dyn KnowledgeClient>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>, client: Arc<dyn KnowledgeClient>) -> Self {
        Self { config, client }
    }

    /// Builds the production client for `config`.
    pub fn from_config(config: Arc<Config>) -> anyhow::Result<Self> {
        let client = create_client(&config)?;
        Ok(Self::new(config, client))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &dyn KnowledgeClient {
        self.client.as_ref()
    }

    /// The mode gate: remote calls are allowed only when both the store URL
    /// and key are configured.
    pub fn cloud_enabled(&self) -> bool {
        self.config.cloud_enabled()
    }
}

/// One block of tool output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// Result of a tool call, as sent to MCP and HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub content: Vec<TextContent>,
    pub is_error: bool,
}

impl ToolResponse {
    fn from_payload(payload: &Value, is_error: bool) -> Self {
        Self {
            content: vec![TextContent {
                kind: "text",
                text: payload.to_string(),
            }],
            is_error,
        }
    }

    /// The first text block parsed back as JSON.
    pub fn payload(&self) -> Option<Value> {
        let first = self.content.first()?;
        serde_json::from_str(&first.text).ok()
    }
}

/// Dispatches `name` with raw `args`.
///
/// Unknown names produce `{"error": "Unknown tool: <name>"}` with `is_error`
/// set; every known tool produces its payload with `is_error` clear.
pub async fn call_tool(ctx: &ToolContext, name: &str, args: &Value) -> ToolResponse {
    match Operation::from_name(name) {
        Some(op) => ToolResponse::from_payload(&op.invoke(args, ctx).await, false),
        None => {
            tracing::warn!(tool = name, "Unknown tool requested");
            ToolResponse::from_payload(&unknown_tool(name), true)
        }
    }
}

pub fn unknown_tool(name: &str) -> Value {
    json!({ "error": format!("Unknown tool: {}", name) })
}

fn invalid(op: Operation, err: ValidationError) -> Value {
    tracing::info!(tool = op.name(), fields = ?err.field_names(), "Rejected tool arguments");
    json!({ "success": false, "error": err.to_string() })
}

fn to_value<T: Serialize>(response: &T) -> Value {
    serde_json::to_value(response).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize tool response");
        json!({ "success": false, "error": e.to_string() })
    })
}

/// `0.873` -> `"87%"`. Rounds half away from zero.
pub(crate) fn percent(fraction: f64) -> String {
    format!("{}%", (fraction * 100.0).round() as i64)
}

/// Message of a remote failure, falling back to `default` when blank.
pub(crate) fn failure_message(err: &anyhow::Error, default: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        default.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixhive_core::client::scripted::ScriptedClient;

    fn offline_ctx() -> (ToolContext, Arc<ScriptedClient>) {
        let client = Arc::new(ScriptedClient::new());
        let ctx = ToolContext::new(Arc::new(Config::default()), client.clone());
        (ctx, client)
    }

    #[test]
    fn names_round_trip_in_listing_order() {
        let names: Vec<_> = Operation::ALL.iter().map(|op| op.name()).collect();
        assert_eq!(
            names,
            vec!["fixhive_search_cases", "fixhive_report_resolution", "fixhive_vote"]
        );
        for op in Operation::ALL {
            assert_eq!(Operation::from_name(op.name()), Some(op));
        }
        assert_eq!(Operation::from_name("search_cases"), None);
    }

    #[test]
    fn only_search_is_read_only() {
        assert!(Operation::Search.read_only());
        assert!(!Operation::Report.read_only());
        assert!(!Operation::Vote.read_only());
    }

    #[test]
    fn schemas_list_required_fields() {
        let search = Operation::Search.parameters_schema();
        assert_eq!(search["required"], json!(["error_message"]));
        assert!(search["properties"]["packages"].is_object());

        let report = Operation::Report.parameters_schema();
        assert_eq!(report["required"], json!(["error_message", "error_signature"]));
        assert!(report["properties"]["language"].is_object());

        let vote = Operation::Vote.parameters_schema();
        assert_eq!(vote["properties"]["value"]["enum"], json!(["up", "down", "report"]));
        assert!(vote["properties"].get("language").is_none());
    }

    #[test]
    fn descriptions_carry_normalization_guide() {
        assert!(Operation::Search.description().contains(NORMALIZATION_GUIDE));
        assert!(Operation::Report.description().contains(NORMALIZATION_GUIDE));
    }

    #[test]
    fn percent_rounds_half_away_from_zero() {
        assert_eq!(percent(0.875), "88%");
        assert_eq!(percent(0.125), "13%");
        assert_eq!(percent(0.0), "0%");
        assert_eq!(percent(1.0), "100%");
        assert_eq!(percent(0.994), "99%");
    }

    #[tokio::test]
    async fn unknown_tool_sets_error_flag() {
        let (ctx, client) = offline_ctx();
        let response = call_tool(&ctx, "fixhive_delete_everything", &json!({})).await;
        assert!(response.is_error);
        assert_eq!(
            response.payload(),
            Some(json!({ "error": "Unknown tool: fixhive_delete_everything" }))
        );
        assert_eq!(client.total_calls(), 0);
    }

    #[tokio::test]
    async fn validation_failure_is_a_payload_not_an_error() {
        let (ctx, client) = offline_ctx();
        let response = call_tool(&ctx, "fixhive_search_cases", &json!({ "limit": 50 })).await;
        assert!(!response.is_error);
        let payload = response.payload().unwrap();
        assert_eq!(payload["success"], json!(false));
        let error = payload["error"].as_str().unwrap();
        assert!(error.contains("error_message"));
        assert!(error.contains("limit"));
        assert_eq!(client.total_calls(), 0);
    }

    #[test]
    fn response_serializes_mcp_shape() {
        let response = ToolResponse::from_payload(&json!({ "found": false }), false);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "content": [{ "type": "text", "text": "{\"found\":false}" }],
                "isError": false
            })
        );
    }
}
