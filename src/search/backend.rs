//! Remote search service seam

use super::models::{QueryOptions, QueryRequest, SearchConfig, SearchResponse, WireResponse};
use crate::error::{RequestError, SearchError};
use crate::network::{algolia_agent, HttpClient};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A hosted search service reachable over HTTPS
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run one query against the configured index
    async fn query(
        &self,
        config: &SearchConfig,
        request: &QueryRequest,
        timeout: Option<Duration>,
    ) -> Result<SearchResponse, SearchError>;

    /// Check that the service accepts the credentials
    async fn probe(&self, config: &SearchConfig, timeout: Option<Duration>) -> Result<(), SearchError> {
        let request = QueryRequest::new("", QueryOptions::new().hits_per_page(1).page(0));
        self.query(config, &request, timeout).await.map(|_| ())
    }
}

/// Algolia REST backend
#[derive(Clone)]
pub struct AlgoliaBackend {
    client: HttpClient,
    host: Option<String>,
}

impl AlgoliaBackend {
    pub fn new(client: HttpClient) -> Self {
        Self { client, host: None }
    }

    /// Send requests to `host` instead of the application's DSN host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    fn base_url(&self, config: &SearchConfig) -> String {
        match self.host {
            Some(ref host) => host.trim_end_matches('/').to_string(),
            None => format!("https://{}-dsn.algolia.net", config.application_id.to_lowercase()),
        }
    }

    fn query_url(&self, config: &SearchConfig) -> String {
        format!(
            "{}/1/indexes/{}/query",
            self.base_url(config),
            urlencoding::encode(&config.index_name)
        )
    }
}

#[async_trait]
impl SearchBackend for AlgoliaBackend {
    async fn query(
        &self,
        config: &SearchConfig,
        request: &QueryRequest,
        timeout: Option<Duration>,
    ) -> Result<SearchResponse, SearchError> {
        let url = self.query_url(config);
        let agent = algolia_agent();
        let body = serde_json::json!({ "params": request.to_params() });

        debug!("Querying index {} for '{}'", config.index_name, request.query);

        let response = self
            .client
            .post_json(
                &url,
                &[
                    ("x-algolia-application-id", config.application_id.as_str()),
                    ("x-algolia-api-key", config.api_key.as_str()),
                    ("content-type", "application/json"),
                ],
                &[("x-algolia-agent", agent.as_str())],
                &body,
                timeout,
            )
            .await?
            .error_for_status()?;

        let wire: WireResponse = response.json()?;
        if let Some(ms) = wire.processing_time_ms {
            debug!("Index {} answered in {}ms", config.index_name, ms);
        }

        wire.normalize()
            .map_err(|e| SearchError::Request(RequestError::Decode(e)))
    }
}
