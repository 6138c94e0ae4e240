//! Drop-in search API
//!
//! `AlgoliaSearch` is the surface a storefront talks to: initialize once,
//! search products, read back the bound config. `SearchContainer` turns its
//! results into view props.

mod container;
mod recent;

pub use container::{SearchContainer, SearchView};
pub use recent::{RecentProduct, RecentProducts};

use crate::config::{ConfigSource, Settings};
use crate::error::SearchError;
use crate::init::{InitOptions, InitOutcome, InitializationState, SearchInitializer};
use crate::metrics::Metrics;
use crate::search::{
    QueryOptions, SearchBackend, SearchConfig, SearchResponse, DEFAULT_HITS_PER_PAGE,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Anything that can answer a product query
#[async_trait]
pub trait ProductSearch: Send + Sync {
    async fn search_products(
        &self,
        query: &str,
        options: QueryOptions,
    ) -> Result<SearchResponse, SearchError>;
}

/// Search capability for one storefront
pub struct AlgoliaSearch {
    initializer: SearchInitializer,
    metrics: Metrics,
    default_hits_per_page: u32,
}

impl AlgoliaSearch {
    pub fn new(initializer: SearchInitializer) -> Self {
        Self {
            initializer,
            metrics: Metrics::new(),
            default_hits_per_page: DEFAULT_HITS_PER_PAGE,
        }
    }

    /// Build from settings, reading credentials through `source`
    pub fn from_settings(
        settings: &Settings,
        source: Arc<dyn ConfigSource>,
        backend: Arc<dyn SearchBackend>,
    ) -> anyhow::Result<Self> {
        let initializer = SearchInitializer::new(source, backend)
            .with_options(InitOptions::from_settings(settings)?);
        Ok(Self::new(initializer).with_hits_per_page(settings.search.hits_per_page))
    }

    pub fn with_hits_per_page(mut self, hits_per_page: u32) -> Self {
        self.default_hits_per_page = hits_per_page;
        self
    }

    /// Set up the search client once. `Ok(None)` means not configured.
    pub async fn initialize(&self) -> InitOutcome {
        self.initializer.initialize().await
    }

    /// Query the product index.
    ///
    /// Fails with `NotInitialized`, without touching the network, unless
    /// initialization has already succeeded.
    pub async fn search_products(
        &self,
        query: &str,
        options: QueryOptions,
    ) -> Result<SearchResponse, SearchError> {
        let started = Instant::now();
        let options = options.or_hits_per_page(self.default_hits_per_page);

        let result = match self.initializer.handle() {
            Some(client) => client.query(query, options).await,
            None => Err(SearchError::NotInitialized),
        };

        match &result {
            Ok(response) => {
                let elapsed = started.elapsed();
                debug!(
                    "Search '{}' returned {} results in {:?}",
                    query,
                    response.results.len(),
                    elapsed
                );
                self.metrics.record_success(elapsed.as_millis() as u64);
            }
            Err(e) => {
                warn!("Search '{}' failed: {}", query, e);
                self.metrics.record_error(e.kind());
            }
        }

        result
    }

    /// The bound config, or `None` before a successful initialization
    pub fn config(&self) -> Option<SearchConfig> {
        self.initializer.config()
    }

    pub fn state(&self) -> InitializationState {
        self.initializer.state()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

#[async_trait]
impl ProductSearch for AlgoliaSearch {
    async fn search_products(
        &self,
        query: &str,
        options: QueryOptions,
    ) -> Result<SearchResponse, SearchError> {
        AlgoliaSearch::search_products(self, query, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KEY_API_KEY, KEY_APPLICATION_ID};
    use crate::error::ErrorKind;
    use crate::network::HttpClient;
    use crate::search::{AlgoliaBackend, StubBackend};
    use std::collections::HashMap;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Arc<HashMap<String, String>> {
        Arc::new(
            [(KEY_APPLICATION_ID, "APPID"), (KEY_API_KEY, "search-key")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_search_products_maps_service_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/indexes/products/query"))
            .and(body_json(serde_json::json!({
                "params": "query=shoe&hitsPerPage=20"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hits": [{"objectID": "a"}, {"objectID": "b"}],
                "nbHits": 2,
                "hitsPerPage": 20,
                "page": 0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = Arc::new(AlgoliaBackend::new(HttpClient::new().unwrap()).with_host(server.uri()));
        let search = AlgoliaSearch::new(SearchInitializer::new(credentials(), backend));
        search.initialize().await.unwrap();

        let response = search
            .search_products("shoe", QueryOptions::new())
            .await
            .unwrap();

        let ids: Vec<_> = response.results.iter().map(|r| r.object_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(response.nb_hits, 2);
        assert_eq!(response.hits_per_page, 20);
        assert_eq!(response.page, 0);
        assert_eq!(search.metrics().total_queries(), 1);
    }

    #[tokio::test]
    async fn test_search_before_initialize_is_not_initialized() {
        let backend = Arc::new(StubBackend::default());
        let search = AlgoliaSearch::new(SearchInitializer::new(credentials(), backend.clone()));

        let err = search
            .search_products("shoe", QueryOptions::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotInitialized);
        assert_eq!(backend.calls(), 0);
        assert!(search.config().is_none());
    }

    #[tokio::test]
    async fn test_disabled_search_never_queries() {
        let backend = Arc::new(StubBackend::default());
        let search = AlgoliaSearch::new(SearchInitializer::new(
            Arc::new(HashMap::<String, String>::new()),
            backend.clone(),
        ));

        assert!(search.initialize().await.unwrap().is_none());
        assert!(search.search_products("shoe", QueryOptions::new()).await.is_err());
        assert_eq!(backend.calls(), 0);
        assert!(matches!(search.state(), InitializationState::Disabled));
    }

    #[tokio::test]
    async fn test_config_after_initialize() {
        let settings = Settings::default();
        let search = AlgoliaSearch::from_settings(
            &settings,
            credentials(),
            Arc::new(StubBackend::default()),
        )
        .unwrap();
        assert!(search.config().is_none());

        search.initialize().await.unwrap();

        assert_eq!(
            search.config(),
            Some(SearchConfig::new("APPID", "search-key", "products"))
        );
    }

    #[tokio::test]
    async fn test_default_page_size_applies() {
        let backend = Arc::new(StubBackend::default());
        let search = AlgoliaSearch::new(SearchInitializer::new(credentials(), backend.clone()))
            .with_hits_per_page(12);
        search.initialize().await.unwrap();

        let response = search
            .search_products("boot", QueryOptions::new().page(2))
            .await
            .unwrap();

        assert_eq!(response.hits_per_page, 12);
        assert_eq!(response.page, 2);
    }
}
