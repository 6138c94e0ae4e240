//! Search client, remote backend and result models

mod backend;
mod client;
mod models;

pub use backend::{AlgoliaBackend, SearchBackend};
pub use client::SearchClient;
pub use models::{
    QueryOptions, QueryRequest, SearchConfig, SearchResponse, SearchResult, DEFAULT_HITS_PER_PAGE,
    DEFAULT_INDEX_NAME, MAX_HITS_PER_PAGE,
};

/// Shared handle to a configured client
pub type ClientHandle = std::sync::Arc<SearchClient>;

#[cfg(test)]
pub(crate) use client::tests::StubBackend;
