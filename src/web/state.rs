//! Application state shared across handlers

use crate::config::Settings;
use crate::dropin::{AlgoliaSearch, SearchContainer};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search facade
    pub search: Arc<AlgoliaSearch>,
    /// View binding over the search facade
    pub container: Arc<SearchContainer>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, search: Arc<AlgoliaSearch>) -> Self {
        let container = SearchContainer::new(search.clone())
            .with_hits_per_page(settings.search.hits_per_page)
            .with_recent_capacity(settings.search.recent_products);

        Self {
            settings: Arc::new(settings),
            search,
            container: Arc::new(container),
        }
    }
}
