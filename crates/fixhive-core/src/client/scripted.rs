//! Scripted [`KnowledgeClient`] for tests and local demos.
//!
//! Each method returns a canned outcome (or a canned failure) and records the
//! request it received, so tests can assert on both what the orchestration
//! layer sent and how many remote calls it made.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::KnowledgeClient;
use crate::models::{
    ReportOutcome, ReportRequest, SearchOutcome, SearchRequest, VoteOutcome, VoteRequest,
};

/// Canned reply for one method: an outcome, or a transport-level failure message.
type Reply<T> = std::result::Result<T, String>;

/// Test double with canned replies and per-method call counters.
pub struct ScriptedClient {
    search_reply: Reply<SearchOutcome>,
    report_reply: Reply<ReportOutcome>,
    vote_reply: Reply<VoteOutcome>,
    search_calls: AtomicUsize,
    report_calls: AtomicUsize,
    vote_calls: AtomicUsize,
    searches: Mutex<Vec<SearchRequest>>,
    reports: Mutex<Vec<ReportRequest>>,
    votes: Mutex<Vec<VoteRequest>>,
}

impl ScriptedClient {
    /// A client whose search finds nothing and whose report and vote succeed
    /// with empty identifiers.
    pub fn new() -> Self {
        Self {
            search_reply: Ok(SearchOutcome::default()),
            report_reply: Ok(ReportOutcome {
                success: true,
                ..Default::default()
            }),
            vote_reply: Ok(VoteOutcome {
                success: true,
                ..Default::default()
            }),
            search_calls: AtomicUsize::new(0),
            report_calls: AtomicUsize::new(0),
            vote_calls: AtomicUsize::new(0),
            searches: Mutex::new(Vec::new()),
            reports: Mutex::new(Vec::new()),
            votes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_search(mut self, outcome: SearchOutcome) -> Self {
        self.search_reply = Ok(outcome);
        self
    }

    pub fn with_report(mut self, outcome: ReportOutcome) -> Self {
        self.report_reply = Ok(outcome);
        self
    }

    pub fn with_vote(mut self, outcome: VoteOutcome) -> Self {
        self.vote_reply = Ok(outcome);
        self
    }

    /// Makes every method fail as if the transport had errored.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.search_reply = Err(message.clone());
        self.report_reply = Err(message.clone());
        self.vote_reply = Err(message);
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn report_calls(&self) -> usize {
        self.report_calls.load(Ordering::SeqCst)
    }

    pub fn vote_calls(&self) -> usize {
        self.vote_calls.load(Ordering::SeqCst)
    }

    /// Total number of remote calls across all methods.
    pub fn total_calls(&self) -> usize {
        self.search_calls() + self.report_calls() + self.vote_calls()
    }

    pub fn last_search(&self) -> Option<SearchRequest> {
        self.searches.lock().ok()?.last().cloned()
    }

    pub fn last_report(&self) -> Option<ReportRequest> {
        self.reports.lock().ok()?.last().cloned()
    }

    pub fn last_vote(&self) -> Option<VoteRequest> {
        self.votes.lock().ok()?.last().cloned()
    }
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

fn record<T: Clone>(log: &Mutex<Vec<T>>, request: &T) {
    if let Ok(mut log) = log.lock() {
        log.push(request.clone());
    }
}

fn replay<T: Clone>(reply: &Reply<T>) -> Result<T> {
    reply.clone().map_err(|message| anyhow!(message))
}

#[async_trait]
impl KnowledgeClient for ScriptedClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        record(&self.searches, request);
        replay(&self.search_reply)
    }

    async fn report(&self, request: &ReportRequest) -> Result<ReportOutcome> {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        record(&self.reports, request);
        replay(&self.report_reply)
    }

    async fn vote(&self, request: &VoteRequest) -> Result<VoteOutcome> {
        self.vote_calls.fetch_add(1, Ordering::SeqCst);
        record(&self.votes, request);
        replay(&self.vote_reply)
    }
}
