//! algolia-dropin: drop-in Algolia product search for storefronts
//!
//! Reads Algolia credentials from configuration, sets up a search client
//! exactly once no matter how many callers ask for it, and maps query
//! responses into props for a result list.

pub mod config;
pub mod dropin;
pub mod error;
pub mod init;
pub mod metrics;
pub mod network;
pub mod search;
pub mod web;

pub use config::{ConfigSource, Settings};
pub use dropin::{AlgoliaSearch, ProductSearch, SearchContainer, SearchView};
pub use error::{ErrorKind, InitError, RequestError, SearchError};
pub use init::{InitializationState, SearchInitializer, SingleFlight};
pub use search::{ClientHandle, QueryOptions, SearchClient, SearchConfig, SearchResponse, SearchResult};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
