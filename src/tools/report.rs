use fixhive_core::models::{Environment, ReportOutcome, ReportRequest};
use fixhive_core::redact::{filter_sensitive_data, sanitize_stack_trace, FilterResult};
use serde::Serialize;

use super::{failure_message, ToolContext, OFFLINE_MESSAGE};
use crate::logging::preview;
use crate::schema::ReportInput;

const EXISTING_SOLUTION_MESSAGE: &str =
    "Thank you! Success count incremented for the existing solution.";
const NEW_CONTRIBUTION_MESSAGE: &str =
    "Thank you for contributing! Your resolution has been recorded.";

/// Payload of `fixhive_report_resolution`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new_group: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new_variant: Option<bool>,
    /// Present only when redaction altered at least one field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

impl ReportResponse {
    fn offline() -> Self {
        Self {
            message: Some(OFFLINE_MESSAGE.to_string()),
            offline: Some(true),
            ..Self::default()
        }
    }

    fn failed(error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// The request after redaction, plus which fields were altered.
struct Sanitized {
    request: ReportRequest,
    warnings: Vec<String>,
}

/// Runs `text` through `filter` unless it is absent or empty. Empty text is
/// dropped from the request.
fn redact_field(
    text: Option<String>,
    filter: fn(&str) -> FilterResult,
    field: &str,
    warnings: &mut Vec<String>,
) -> Option<String> {
    let text = text.filter(|t| !t.is_empty())?;
    let result = filter(&text);
    if result.contains_sensitive {
        warnings.push(format!("Some sensitive data was redacted from the {}", field));
    }
    Some(result.filtered)
}

fn sanitize(input: ReportInput) -> Sanitized {
    let mut warnings = Vec::new();
    let solution = redact_field(input.solution, filter_sensitive_data, "solution", &mut warnings);
    let cause = redact_field(input.cause, filter_sensitive_data, "cause", &mut warnings);
    let code_diff = redact_field(input.code_diff, filter_sensitive_data, "code diff", &mut warnings);
    let stack_trace = redact_field(
        input.stack_trace,
        sanitize_stack_trace,
        "stack trace",
        &mut warnings,
    );

    let request = ReportRequest {
        error_message: input.error_message,
        error_signature: input.error_signature,
        stack_trace,
        cause,
        solution,
        solution_steps: input.solution_steps,
        code_diff,
        environment: Environment::new(input.language, input.framework, input.packages),
        solved: input.solved,
        used_variant_id: input.used_variant_id,
        what_was_tried: input.what_was_tried,
        time_spent: input.time_spent,
    };
    Sanitized { request, warnings }
}

/// Frames a store outcome. Creation vs increment is read from the store's
/// flags; the message only reflects whether the caller named a variant.
fn reshape(outcome: ReportOutcome, used_variant: bool, warnings: Vec<String>) -> ReportResponse {
    if !outcome.success {
        let error = outcome
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "Failed to report resolution".to_string());
        return ReportResponse::failed(error);
    }

    let message = if used_variant {
        EXISTING_SOLUTION_MESSAGE
    } else {
        NEW_CONTRIBUTION_MESSAGE
    };

    ReportResponse {
        success: true,
        message: Some(message.to_string()),
        resolution_id: outcome.resolution_id,
        group_id: outcome.group_id,
        variant_id: outcome.variant_id,
        is_new_group: Some(outcome.is_new_group),
        is_new_variant: Some(outcome.is_new_variant),
        warnings: (!warnings.is_empty()).then_some(warnings),
        ..ReportResponse::default()
    }
}

pub(super) async fn handle(input: ReportInput, ctx: &ToolContext) -> ReportResponse {
    tracing::info!(
        signature = preview(&input.error_signature, 100),
        solved = input.solved,
        used_variant = input.used_variant_id.as_deref(),
        "Reporting resolution"
    );

    if !ctx.cloud_enabled() {
        return ReportResponse::offline();
    }

    let Sanitized { request, warnings } = sanitize(input);
    if !warnings.is_empty() {
        tracing::info!(count = warnings.len(), "Redacted sensitive data before upload");
    }

    let used_variant = request.used_variant_id.is_some();
    match ctx.client().report(&request).await {
        Ok(outcome) => reshape(outcome, used_variant, warnings),
        Err(e) => {
            tracing::error!(error = %e, "Report resolution failed");
            ReportResponse::failed(failure_message(&e, "Report failed"))
        }
    }
}
