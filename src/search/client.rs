//! Configured search client

use super::backend::SearchBackend;
use super::models::{QueryOptions, QueryRequest, SearchConfig, SearchResponse};
use crate::error::{RequestError, SearchError};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Search client bound to one set of credentials and one index.
///
/// The binding is write-once: after `configure` succeeds the config never
/// changes for the life of the client.
pub struct SearchClient {
    backend: Arc<dyn SearchBackend>,
    config: OnceCell<SearchConfig>,
}

impl SearchClient {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            config: OnceCell::new(),
        }
    }

    /// Bind credentials and target index
    pub fn configure(&self, config: SearchConfig) -> Result<(), SearchError> {
        config.validate()?;
        self.config
            .set(config)
            .map_err(|_| SearchError::invalid("search client is already configured"))
    }

    /// The bound config, or `None` if never configured
    pub fn config(&self) -> Option<&SearchConfig> {
        self.config.get()
    }

    pub fn is_configured(&self) -> bool {
        self.config.get().is_some()
    }

    /// Send a query to the configured index
    pub async fn query(
        &self,
        text: &str,
        options: QueryOptions,
    ) -> Result<SearchResponse, SearchError> {
        self.send(text, options, None).await
    }

    /// Send a query, failing with a timeout error after `timeout`
    pub async fn query_with_timeout(
        &self,
        text: &str,
        options: QueryOptions,
        timeout: Duration,
    ) -> Result<SearchResponse, SearchError> {
        match tokio::time::timeout(timeout, self.send(text, options, Some(timeout))).await {
            Ok(result) => result,
            Err(_) => Err(RequestError::Timeout(timeout).into()),
        }
    }

    /// Zero-hit request confirming the service accepts the credentials
    pub async fn verify(&self, timeout: Option<Duration>) -> Result<(), SearchError> {
        let config = self.config.get().ok_or(SearchError::NotInitialized)?;
        self.backend.probe(config, timeout).await
    }

    async fn send(
        &self,
        text: &str,
        options: QueryOptions,
        timeout: Option<Duration>,
    ) -> Result<SearchResponse, SearchError> {
        let config = self.config.get().ok_or(SearchError::NotInitialized)?;
        let request = QueryRequest::new(text, options);
        let response = self.backend.query(config, &request, timeout).await?;
        debug!(
            "Query '{}' returned {} of {} hits",
            text,
            response.results.len(),
            response.nb_hits
        );
        Ok(response)
    }
}

impl fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchClient")
            .field("config", &self.config.get())
            .finish()
    }
}
