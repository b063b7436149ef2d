use fixhive_core::models::{Environment, RankedVariant, SearchOutcome, SearchRequest};
use fixhive_core::signature::hash_signature;
use serde::Serialize;

use super::{failure_message, percent, ToolContext, OFFLINE_MESSAGE};
use crate::logging::preview;
use crate::schema::SearchInput;

const NOT_FOUND_MESSAGE: &str = "No similar errors found in the knowledge base.";
const NOT_FOUND_SUGGESTIONS: [&str; 3] = [
    "Try normalizing the error message with placeholders",
    "Check if the error message is complete",
    "After resolving, use fixhive_report_resolution to contribute",
];
const HIT_HINT: &str = "Use fixhive_report_resolution to report whether a solution worked, or fixhive_vote to upvote/downvote.";

/// Payload of `fixhive_search_cases`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The matched group and its solutions, in the store's rank order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub group_id: String,
    pub error_signature: String,
    pub total_reports: i64,
    pub variant_count: usize,
    pub solutions: Vec<SolutionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionView {
    pub rank: u32,
    pub variant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// Environment match as a whole percent, e.g. `"87%"`.
    pub match_score: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_reason: Option<String>,
    pub success_rate: String,
    pub votes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution_steps: Option<Vec<String>>,
}

impl SearchResponse {
    fn empty() -> Self {
        Self {
            found: false,
            result: None,
            hint: None,
            message: None,
            suggestions: None,
            offline: None,
            error: None,
        }
    }

    fn offline() -> Self {
        Self {
            message: Some(OFFLINE_MESSAGE.to_string()),
            offline: Some(true),
            ..Self::empty()
        }
    }

    fn not_found() -> Self {
        Self {
            message: Some(NOT_FOUND_MESSAGE.to_string()),
            suggestions: Some(NOT_FOUND_SUGGESTIONS.iter().map(|s| s.to_string()).collect()),
            ..Self::empty()
        }
    }

    fn failed(error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::empty()
        }
    }

    fn found(result: SearchResult) -> Self {
        Self {
            found: true,
            result: Some(result),
            hint: Some(HIT_HINT.to_string()),
            ..Self::empty()
        }
    }
}

impl From<RankedVariant> for SolutionView {
    fn from(v: RankedVariant) -> Self {
        Self {
            rank: v.rank,
            variant_id: v.id,
            solution: v.solution,
            cause: v.cause,
            match_score: percent(v.environment_match),
            match_reason: v.match_reason,
            success_rate: percent(v.success_rate),
            votes: v.score,
            solution_steps: v.solution_steps,
        }
    }
}

fn build_request(input: SearchInput) -> SearchRequest {
    let signature_hash = input.error_signature.as_deref().map(hash_signature);
    SearchRequest {
        error_message: input.error_message,
        error_signature: input.error_signature,
        environment: Environment::new(input.language, input.framework, input.packages),
        signature_hash,
        limit: input.limit,
    }
}

/// Variant order is kept as the store ranked it.
fn reshape(outcome: SearchOutcome) -> SearchResponse {
    match outcome.into_hit() {
        Some((group, variants)) => SearchResponse::found(SearchResult {
            group_id: group.id,
            error_signature: group.error_signature,
            total_reports: group.total_reports,
            variant_count: variants.len(),
            solutions: variants.into_iter().map(SolutionView::from).collect(),
        }),
        None => SearchResponse::not_found(),
    }
}

pub(super) async fn handle(input: SearchInput, ctx: &ToolContext) -> SearchResponse {
    tracing::info!(
        error_message = preview(&input.error_message, 100),
        signature = input.error_signature.as_deref().map(|s| preview(s, 100)),
        language = input.language.as_deref(),
        framework = input.framework.as_deref(),
        "Searching for error solutions"
    );

    if !ctx.cloud_enabled() {
        return SearchResponse::offline();
    }

    let request = build_request(input);
    match ctx.client().search(&request).await {
        Ok(outcome) => {
            let response = reshape(outcome);
            tracing::debug!(found = response.found, "Search complete");
            response
        }
        Err(e) => {
            tracing::error!(error = %e, "Search failed");
            SearchResponse::failed(failure_message(&e, "Search failed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixhive_core::models::CaseGroup;
    use serde_json::json;

    fn input() -> SearchInput {
        SearchInput {
            error_message: "TypeError: foo is undefined".into(),
            error_signature: None,
            language: None,
            framework: None,
            packages: None,
            limit: 5,
        }
    }

    fn variant(id: &str, rank: u32, env: f64, success: f64) -> RankedVariant {
        RankedVariant {
            id: id.into(),
            cause: None,
            solution: Some("pin the version".into()),
            solution_steps: None,
            success_rate: success,
            score: 4,
            rank,
            environment_match: env,
            match_reason: Some("same framework".into()),
        }
    }

    #[test]
    fn request_hashes_signature_only() {
        let request = build_request(input());
        assert_eq!(request.signature_hash, None);
        assert_eq!(request.environment.language, "unknown");

        let request = build_request(SearchInput {
            error_signature: Some("TypeError: {value} is undefined".into()),
            ..input()
        });
        assert_eq!(
            request.signature_hash.as_deref(),
            Some(hash_signature("TypeError: {value} is undefined").as_str())
        );
    }

    #[test]
    fn reshape_preserves_store_order() {
        let outcome = SearchOutcome {
            group: Some(CaseGroup {
                id: "g-1".into(),
                error_signature: "TypeError: {value} is undefined".into(),
                total_reports: 12,
            }),
            variants: vec![variant("b", 2, 0.5, 0.25), variant("a", 1, 0.875, 0.9)],
        };
        let response = reshape(outcome);
        let result = response.result.unwrap();
        assert_eq!(result.variant_count, 2);
        let ids: Vec<_> = result.solutions.iter().map(|s| s.variant_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(result.solutions[1].match_score, "88%");
        assert_eq!(result.solutions[1].success_rate, "90%");
    }

    #[test]
    fn group_without_variants_is_not_found() {
        let outcome = SearchOutcome {
            group: Some(CaseGroup {
                id: "g".into(),
                error_signature: "x".into(),
                total_reports: 0,
            }),
            variants: vec![],
        };
        assert_eq!(reshape(outcome), SearchResponse::not_found());
    }

    #[test]
    fn hit_payload_omits_absent_fields() {
        let mut v = variant("a", 1, 1.0, 0.0);
        v.match_reason = None;
        v.solution = None;
        let value = serde_json::to_value(SolutionView::from(v)).unwrap();
        assert_eq!(
            value,
            json!({
                "rank": 1,
                "variantId": "a",
                "matchScore": "100%",
                "successRate": "0%",
                "votes": 4
            })
        );
    }
}
