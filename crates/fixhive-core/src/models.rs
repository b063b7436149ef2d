//! Core data models exchanged with the knowledge base.
//!
//! Every value here is request scoped: the orchestration layer builds
//! requests, hands them to a [`KnowledgeClient`](crate::client::KnowledgeClient),
//! and reshapes the outcomes. Groups and variants are owned by the remote
//! store and are never cached locally.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Language used when the caller does not name one.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// The caller's runtime context, used as a matching signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<BTreeMap<String, String>>,
}

impl Environment {
    /// Builds an environment, defaulting the language to `"unknown"`.
    ///
    /// An empty language string counts as absent.
    pub fn new(
        language: Option<String>,
        framework: Option<String>,
        packages: Option<BTreeMap<String, String>>,
    ) -> Self {
        let language = language
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());
        Self {
            language,
            framework,
            packages,
        }
    }
}

/// A canonical cluster of reports sharing one normalized signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseGroup {
    pub id: String,
    pub error_signature: String,
    #[serde(default)]
    pub total_reports: i64,
}

/// One candidate solution under a group, as ranked by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedVariant {
    pub id: String,
    #[serde(default)]
    pub cause: Option<String>,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub solution_steps: Option<Vec<String>>,
    /// Fraction of reports where this variant solved the error, in `[0, 1]`.
    #[serde(default)]
    pub success_rate: f64,
    /// Cumulative vote score.
    #[serde(default)]
    pub score: i64,
    /// Position assigned by the remote ranking step (1 = best).
    pub rank: u32,
    /// How closely the variant's environment matches the caller's, in `[0, 1]`.
    #[serde(default)]
    pub environment_match: f64,
    #[serde(default)]
    pub match_reason: Option<String>,
}

/// Query sent to the remote matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_signature: Option<String>,
    pub environment: Environment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_hash: Option<String>,
    pub limit: u32,
}

/// Matcher response: at most one group and its ranked variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    #[serde(default)]
    pub group: Option<CaseGroup>,
    #[serde(default)]
    pub variants: Vec<RankedVariant>,
}

impl SearchOutcome {
    /// True when the store found no group or the group has no variants.
    pub fn is_empty(&self) -> bool {
        self.group.is_none() || self.variants.is_empty()
    }

    /// The group and its ranked variants, or `None` when [`is_empty`](Self::is_empty).
    pub fn into_hit(self) -> Option<(CaseGroup, Vec<RankedVariant>)> {
        if self.is_empty() {
            return None;
        }
        let SearchOutcome { group, variants } = self;
        group.map(|group| (group, variants))
    }
}

/// A sanitized resolution record submitted to the store.
///
/// Free-text fields must already have passed through [`crate::redact`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub error_message: String,
    pub error_signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_steps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_diff: Option<String>,
    pub environment: Environment,
    pub solved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_variant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub what_was_tried: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
}

/// Store response to a resolution report.
///
/// Whether a group or variant was created is decided by the store alone;
/// the flags are passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub resolution_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub variant_id: Option<String>,
    #[serde(default)]
    pub is_new_group: bool,
    #[serde(default)]
    pub is_new_variant: bool,
}

/// A vote on a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteValue {
    Up,
    Down,
    /// Flags the variant for moderation; requires a reason.
    Report,
}

impl VoteValue {
    pub const ALL: [VoteValue; 3] = [VoteValue::Up, VoteValue::Down, VoteValue::Report];

    pub fn as_str(self) -> &'static str {
        match self {
            VoteValue::Up => "up",
            VoteValue::Down => "down",
            VoteValue::Report => "report",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == value)
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub variant_id: String,
    pub value: VoteValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Store response to a vote. `previous_vote` is set when the caller had
/// already voted on the variant and the store replaced that vote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub vote_id: Option<String>,
    #[serde(default)]
    pub previous_vote: Option<VoteValue>,
    #[serde(default)]
    pub current_score: Option<i64>,
}
