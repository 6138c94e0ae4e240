//! Container binding between a product search and presentational code

use super::recent::{RecentProduct, RecentProducts};
use super::ProductSearch;
use crate::error::SearchError;
use crate::search::{QueryOptions, SearchResponse, SearchResult};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Props handed to the result list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchView {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub nb_hits: u64,
    /// Zero-based page number
    pub page: u32,
    pub hits_per_page: u32,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Search is not available (not configured or not initialized)
    pub disabled: bool,
}

impl SearchView {
    pub fn idle(query: &str) -> Self {
        Self {
            query: query.to_string(),
            ..Default::default()
        }
    }

    pub fn loading(query: &str) -> Self {
        Self {
            is_loading: true,
            ..Self::idle(query)
        }
    }

    pub fn disabled(query: &str) -> Self {
        Self {
            disabled: true,
            ..Self::idle(query)
        }
    }

    pub fn failed(query: &str, err: &SearchError) -> Self {
        Self {
            error: Some(err.to_string()),
            ..Self::idle(query)
        }
    }

    /// The request itself could not be used; nothing was searched
    pub fn rejected(query: &str, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::idle(query)
        }
    }

    pub fn from_response(query: &str, response: SearchResponse) -> Self {
        Self {
            query: query.to_string(),
            results: response.results,
            nb_hits: response.nb_hits,
            page: response.page,
            hits_per_page: response.hits_per_page,
            ..Default::default()
        }
    }

    /// Nothing to show: no hits, no error
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.error.is_none()
    }
}

/// Runs searches for a result list and tracks selected products
pub struct SearchContainer {
    search: Arc<dyn ProductSearch>,
    hits_per_page: Option<u32>,
    recent: Mutex<RecentProducts>,
}

impl SearchContainer {
    pub fn new(search: Arc<dyn ProductSearch>) -> Self {
        Self {
            search,
            hits_per_page: None,
            recent: Mutex::new(RecentProducts::default()),
        }
    }

    pub fn with_hits_per_page(mut self, hits_per_page: u32) -> Self {
        self.hits_per_page = Some(hits_per_page);
        self
    }

    pub fn with_recent_capacity(mut self, capacity: usize) -> Self {
        self.recent = Mutex::new(RecentProducts::new(capacity));
        self
    }

    /// Search and return the final view
    pub async fn search(&self, query: &str, options: QueryOptions) -> SearchView {
        self.search_with(query, options, |_| {}).await
    }

    /// Search, reporting the loading view and then the final view to `render`
    pub async fn search_with<F>(&self, query: &str, options: QueryOptions, mut render: F) -> SearchView
    where
        F: FnMut(&SearchView),
    {
        let query = query.trim();
        if query.is_empty() {
            let view = SearchView::idle(query);
            render(&view);
            return view;
        }

        render(&SearchView::loading(query));

        let options = match self.hits_per_page {
            Some(hits) => options.or_hits_per_page(hits),
            None => options,
        };

        let view = match self.search.search_products(query, options).await {
            Ok(response) => SearchView::from_response(query, response),
            Err(SearchError::NotInitialized) => SearchView::disabled(query),
            Err(e) => {
                warn!("Search for '{}' failed: {}", query, e);
                SearchView::failed(query, &e)
            }
        };

        render(&view);
        view
    }

    /// Remember a product the shopper picked from the results
    pub fn select(&self, result: &SearchResult) {
        self.recent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .record(result.clone());
    }

    pub fn recent(&self) -> Vec<RecentProduct> {
        self.recent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .items()
            .cloned()
            .collect()
    }
}
