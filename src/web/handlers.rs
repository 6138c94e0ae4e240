//! HTTP request handlers

use super::state::AppState;
use crate::dropin::{RecentProduct, SearchView};
use crate::metrics::QueryStats;
use crate::search::{QueryOptions, SearchConfig, SearchResult};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

/// Query parameters for search.
///
/// Paging values are taken as text so a bad value can be reported in the
/// view instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Search query
    pub q: Option<String>,
    /// Zero-based page number
    pub page: Option<String>,
    /// Results per page
    #[serde(rename = "hitsPerPage")]
    pub hits_per_page: Option<String>,
}

impl SearchParams {
    fn options(&self) -> Result<QueryOptions, String> {
        Ok(QueryOptions {
            hits_per_page: parse_count("hitsPerPage", self.hits_per_page.as_deref())?,
            page: parse_count("page", self.page.as_deref())?,
        })
    }
}

fn parse_count(name: &str, raw: Option<&str>) -> Result<Option<u32>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| format!("invalid {}: '{}' is not a non-negative integer", name, value)),
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub search: &'static str,
}

/// Search handler. Always answers with a view; problems land in `error`.
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Json<SearchView> {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => return Json(SearchView::rejected("", rejection.body_text())),
    };
    let query = params.q.clone().unwrap_or_default();
    let options = match params.options() {
        Ok(options) => options,
        Err(message) => return Json(SearchView::rejected(query.trim(), message)),
    };

    Json(state.container.search(&query, options).await)
}

/// Record a product the shopper picked and return the updated history
pub async fn select(
    State(state): State<AppState>,
    Json(product): Json<SearchResult>,
) -> Json<Vec<RecentProduct>> {
    state.container.select(&product);
    Json(state.container.recent())
}

/// Recently viewed products, most recent first
pub async fn recent(State(state): State<AppState>) -> Json<Vec<RecentProduct>> {
    Json(state.container.recent())
}

/// Bound search config with the api key masked
pub async fn config(State(state): State<AppState>) -> Json<Option<SearchConfig>> {
    Json(state.search.config().map(|c| c.redacted()))
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        search: state.search.state().name(),
    })
}

/// Query statistics
pub async fn stats(State(state): State<AppState>) -> Json<QueryStats> {
    Json(state.search.metrics().snapshot())
}
