use fixhive_core::models::{VoteOutcome, VoteRequest, VoteValue};
use serde::Serialize;

use super::{failure_message, ToolContext, OFFLINE_MESSAGE};
use crate::schema::VoteInput;

const REASON_REQUIRED: &str = "Reason is required when reporting content";

/// Payload of `fixhive_vote`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_vote: Option<VoteValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_score: Option<i64>,
}

impl VoteResponse {
    fn offline() -> Self {
        Self {
            message: Some(OFFLINE_MESSAGE.to_string()),
            offline: Some(true),
            ..Self::default()
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

fn thanks(value: VoteValue) -> &'static str {
    match value {
        VoteValue::Up => {
            "Thank you for your upvote! This helps other developers find useful solutions."
        }
        VoteValue::Down => "Thank you for your feedback. This helps improve solution quality.",
        VoteValue::Report => "Thank you for reporting. Our team will review this content.",
    }
}

fn reshape(outcome: VoteOutcome, value: VoteValue) -> VoteResponse {
    if !outcome.success {
        return VoteResponse::failed(
            outcome
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "Vote failed".to_string()),
        );
    }
    VoteResponse {
        success: true,
        message: Some(thanks(value).to_string()),
        vote_id: outcome.vote_id,
        previous_vote: outcome.previous_vote,
        current_score: outcome.current_score,
        ..VoteResponse::default()
    }
}

pub(super) async fn handle(input: VoteInput, ctx: &ToolContext) -> VoteResponse {
    tracing::info!(
        variant_id = %input.variant_id,
        value = %input.value,
        "Processing vote"
    );

    // Checked before the mode gate so the rule holds offline too.
    let has_reason = input.reason.as_deref().is_some_and(|r| !r.is_empty());
    if input.value == VoteValue::Report && !has_reason {
        return VoteResponse::failed(REASON_REQUIRED);
    }

    if !ctx.cloud_enabled() {
        return VoteResponse::offline();
    }

    let request = VoteRequest {
        variant_id: input.variant_id,
        value: input.value,
        reason: input.reason,
    };
    match ctx.client().vote(&request).await {
        Ok(outcome) => reshape(outcome, request.value),
        Err(e) => {
            tracing::error!(error = %e, "Vote failed");
            VoteResponse::failed(failure_message(&e, "Vote failed"))
        }
    }
}
