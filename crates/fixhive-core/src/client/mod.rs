//! Knowledge-base client abstraction.
//!
//! The [`KnowledgeClient`] trait is the seam between the orchestration layer
//! and the remote store that owns groups, variants, ranking and votes. The
//! application crate provides the HTTP implementation; [`DisabledClient`] is
//! wired when no store is configured, and [`scripted::ScriptedClient`] is a
//! test double with canned outcomes.
//!
//! Implementations must be `Send + Sync` so one client can serve concurrent
//! tool invocations.

pub mod scripted;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::models::{
    ReportOutcome, ReportRequest, SearchOutcome, SearchRequest, VoteOutcome, VoteRequest,
};

/// Remote store operations used by the tools.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`search`](KnowledgeClient::search) | Find the group for an error and its ranked variants |
/// | [`report`](KnowledgeClient::report) | Submit a sanitized resolution |
/// | [`vote`](KnowledgeClient::vote) | Up/down-vote or report a variant |
///
/// A returned `Err` means the call itself failed (transport, status,
/// undecodable body). A store-side refusal is an `Ok` outcome with
/// `success == false`.
#[async_trait]
pub trait KnowledgeClient: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome>;

    async fn report(&self, request: &ReportRequest) -> Result<ReportOutcome>;

    async fn vote(&self, request: &VoteRequest) -> Result<VoteOutcome>;
}

/// A client that refuses every call.
///
/// Used when the remote store is not configured. The mode gate keeps tools
/// from reaching it; a call that slips through fails loudly instead of
/// pretending to succeed.
pub struct DisabledClient;

#[async_trait]
impl KnowledgeClient for DisabledClient {
    async fn search(&self, _request: &SearchRequest) -> Result<SearchOutcome> {
        bail!("knowledge base client is disabled")
    }

    async fn report(&self, _request: &ReportRequest) -> Result<ReportOutcome> {
        bail!("knowledge base client is disabled")
    }

    async fn vote(&self, _request: &VoteRequest) -> Result<VoteOutcome> {
        bail!("knowledge base client is disabled")
    }
}
