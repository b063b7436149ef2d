//! HTTP implementation of [`KnowledgeClient`].
//!
//! Each operation is a JSON `POST` to a remote procedure on the store:
//!
//! | Method | Endpoint |
//! |--------|----------|
//! | `search` | `{url}/rest/v1/rpc/search_cases` |
//! | `report` | `{url}/rest/v1/rpc/report_resolution` |
//! | `vote` | `{url}/rest/v1/rpc/vote` |
//!
//! Requests carry the access key in both the `apikey` and
//! `Authorization: Bearer` headers, and the device id in the body.
//!
//! There is no retry, backoff or timeout here: a failed call is reported to
//! the tool immediately and the assistant decides whether to try again.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use fixhive_core::client::{DisabledClient, KnowledgeClient};
use fixhive_core::models::{
    ReportOutcome, ReportRequest, SearchOutcome, SearchRequest, VoteOutcome, VoteRequest,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::device::{resolve_device_id, short_id};
use crate::error::RemoteError;

const RPC_SEARCH: &str = "search_cases";
const RPC_REPORT: &str = "report_resolution";
const RPC_VOTE: &str = "vote";

/// Knowledge-base client speaking JSON over HTTP.
pub struct HttpKnowledgeClient {
    http: reqwest::Client,
    base_url: String,
    key: String,
    device_id: String,
}

/// Request body: the operation's fields plus the caller's device id.
#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    device_id: &'a str,
    #[serde(flatten)]
    request: &'a T,
}

impl HttpKnowledgeClient {
    pub fn new(
        base_url: impl Into<String>,
        key: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("fixhive/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key: key.into(),
            device_id: device_id.into(),
        })
    }

    fn endpoint(&self, rpc: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, rpc)
    }

    async fn call<Req, Resp>(&self, rpc: &str, request: &Req) -> Result<Resp, RemoteError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let endpoint = self.endpoint(rpc);
        let body = Envelope {
            device_id: &self.device_id,
            request,
        };

        let response = self
            .http
            .post(&endpoint)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .json(&body)
            .send()
            .await
            .map_err(|source| RemoteError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| RemoteError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                endpoint,
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|source| RemoteError::Decode { endpoint, source })
    }
}

#[async_trait]
impl KnowledgeClient for HttpKnowledgeClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        Ok(self.call(RPC_SEARCH, request).await?)
    }

    async fn report(&self, request: &ReportRequest) -> Result<ReportOutcome> {
        Ok(self.call(RPC_REPORT, request).await?)
    }

    async fn vote(&self, request: &VoteRequest) -> Result<VoteOutcome> {
        Ok(self.call(RPC_VOTE, request).await?)
    }
}

/// Builds the client for `config`: HTTP when cloud mode is enabled,
/// [`DisabledClient`] otherwise.
pub fn create_client(config: &Config) -> Result<Arc<dyn KnowledgeClient>> {
    match config.remote_credentials() {
        Some((url, key)) => {
            let device_id = resolve_device_id(config)?;
            tracing::info!(
                url,
                device = %short_id(&device_id),
                "Using remote knowledge base"
            );
            Ok(Arc::new(HttpKnowledgeClient::new(url, key, device_id)?))
        }
        None => Ok(Arc::new(DisabledClient)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixhive_core::models::VoteValue;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = HttpKnowledgeClient::new("https://kb.example.co/", "k", "d").unwrap();
        assert_eq!(
            client.endpoint(RPC_VOTE),
            "https://kb.example.co/rest/v1/rpc/vote"
        );
    }

    #[test]
    fn envelope_flattens_request() {
        let request = VoteRequest {
            variant_id: "v".into(),
            value: VoteValue::Down,
            reason: None,
        };
        let body = serde_json::to_value(Envelope {
            device_id: "dev-1",
            request: &request,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "device_id": "dev-1", "variant_id": "v", "value": "down" })
        );
    }
}
