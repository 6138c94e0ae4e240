//! Search configuration, request and result models

use crate::config::{ConfigSource, KEY_API_KEY, KEY_APPLICATION_ID, KEY_INDEX_NAME};
use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index queried when none is configured
pub const DEFAULT_INDEX_NAME: &str = "products";

/// Page size used when the caller does not specify one
pub const DEFAULT_HITS_PER_PAGE: u32 = 20;

/// Largest page size the service accepts
pub const MAX_HITS_PER_PAGE: u32 = 1000;

/// Credentials and target index for the search service
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    pub application_id: String,
    pub api_key: String,
    pub index_name: String,
}

impl SearchConfig {
    pub fn new(
        application_id: impl Into<String>,
        api_key: impl Into<String>,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            application_id: application_id.into(),
            api_key: api_key.into(),
            index_name: index_name.into(),
        }
    }

    /// Read the config from a source, defaulting the index name.
    ///
    /// Fails with `ConfigurationMissing` naming every absent required key.
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self, SearchError> {
        let read = |key: &str| {
            source
                .get_config_value(key)
                .filter(|value| !value.trim().is_empty())
        };

        let application_id = read(KEY_APPLICATION_ID);
        let api_key = read(KEY_API_KEY);
        let index_name = read(KEY_INDEX_NAME).unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string());

        match (application_id, api_key) {
            (Some(application_id), Some(api_key)) => Ok(Self {
                application_id,
                api_key,
                index_name,
            }),
            (application_id, api_key) => {
                let mut fields = Vec::new();
                if application_id.is_none() {
                    fields.push(KEY_APPLICATION_ID);
                }
                if api_key.is_none() {
                    fields.push(KEY_API_KEY);
                }
                Err(SearchError::ConfigurationMissing { fields })
            }
        }
    }

    /// Check that the credentials are usable
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.application_id.trim().is_empty() {
            return Err(SearchError::invalid("applicationId must not be empty"));
        }
        if self.api_key.trim().is_empty() {
            return Err(SearchError::invalid("apiKey must not be empty"));
        }
        if self.index_name.trim().is_empty() {
            return Err(SearchError::invalid("indexName must not be empty"));
        }
        Ok(())
    }

    /// Copy with the api key masked, safe to expose
    pub fn redacted(&self) -> Self {
        Self {
            api_key: mask(&self.api_key),
            ..self.clone()
        }
    }
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("application_id", &self.application_id)
            .field("api_key", &mask(&self.api_key))
            .field("index_name", &self.index_name)
            .finish()
    }
}

fn mask(secret: &str) -> String {
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{}", tail)
    }
}

/// Paging options for a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    pub hits_per_page: Option<u32>,
    /// Zero-based page number
    pub page: Option<u32>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hits_per_page(mut self, hits: u32) -> Self {
        self.hits_per_page = Some(hits);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Fill a missing page size from a default
    pub fn or_hits_per_page(mut self, default: u32) -> Self {
        self.hits_per_page.get_or_insert(default);
        self
    }

    /// Page size clamped to what the service accepts
    pub fn effective_hits_per_page(&self) -> Option<u32> {
        self.hits_per_page.map(|h| h.clamp(1, MAX_HITS_PER_PAGE))
    }
}

/// A query bound for the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub query: String,
    pub options: QueryOptions,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>, options: QueryOptions) -> Self {
        Self {
            query: query.into(),
            options,
        }
    }

    /// Encode as the form-encoded `params` string the query endpoint expects
    pub fn to_params(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        serializer.append_pair("query", &self.query);
        if let Some(hits) = self.options.effective_hits_per_page() {
            serializer.append_pair("hitsPerPage", &hits.to_string());
        }
        if let Some(page) = self.options.page {
            serializer.append_pair("page", &page.to_string());
        }
        serializer.finish()
    }
}

/// A single matched record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "objectID")]
    pub object_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Every other attribute of the record
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SearchResult {
    pub fn new(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            name: None,
            sku: None,
            price: None,
            image: None,
            url: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Build from a raw hit.
    ///
    /// Display fields are decoded leniently: a value of an unexpected shape
    /// (a localized `name` object, a structured `price`) stays in `extra`
    /// instead of failing the hit. A numeric `sku` is kept as text.
    pub fn from_hit(
        mut hit: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, serde_json::Error> {
        let raw_name = hit.remove("name");
        let raw_sku = hit.remove("sku");
        let raw_price = hit.remove("price");
        let raw_image = hit.remove("image");
        let raw_url = hit.remove("url");
        let mut result: SearchResult = serde_json::from_value(serde_json::Value::Object(hit))?;

        result.name = text_field(&mut result.extra, "name", raw_name, false);
        result.sku = text_field(&mut result.extra, "sku", raw_sku, true);
        result.image = text_field(&mut result.extra, "image", raw_image, false);
        result.url = text_field(&mut result.extra, "url", raw_url, false);

        match raw_price {
            None | Some(serde_json::Value::Null) => {}
            Some(value) => match numeric(&value) {
                Some(price) => result.price = Some(price),
                None => {
                    result.extra.insert("price".to_string(), value);
                }
            },
        }
        Ok(result)
    }
}

fn text_field(
    extra: &mut serde_json::Map<String, serde_json::Value>,
    key: &str,
    raw: Option<serde_json::Value>,
    allow_number: bool,
) -> Option<String> {
    match raw? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) if allow_number => Some(n.to_string()),
        other => {
            extra.insert(key.to_string(), other);
            None
        }
    }
}

fn numeric(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Normalized response handed to presentational code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Hits in relevance order
    pub results: Vec<SearchResult>,
    /// Total number of matches, across all pages
    pub nb_hits: u64,
    pub hits_per_page: u32,
    /// Zero-based page number
    pub page: u32,
}

impl SearchResponse {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            nb_hits: 0,
            hits_per_page: DEFAULT_HITS_PER_PAGE,
            page: 0,
        }
    }

    /// Number of pages available for this query
    pub fn nb_pages(&self) -> u32 {
        if self.hits_per_page == 0 {
            return 0;
        }
        let pages = self.nb_hits.div_ceil(u64::from(self.hits_per_page));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_next_page(&self) -> bool {
        self.page.saturating_add(1) < self.nb_pages()
    }

    /// Options for fetching the following page, if there is one
    pub fn next_page(&self) -> Option<QueryOptions> {
        self.has_next_page().then(|| {
            QueryOptions::new()
                .hits_per_page(self.hits_per_page)
                .page(self.page + 1)
        })
    }
}

/// Response body of the query endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireResponse {
    #[serde(default)]
    pub hits: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub nb_hits: u64,
    #[serde(default)]
    pub hits_per_page: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default, rename = "processingTimeMS")]
    pub processing_time_ms: Option<u64>,
}

impl WireResponse {
    /// Normalize into a `SearchResponse`, keeping hit order
    pub fn normalize(self) -> Result<SearchResponse, serde_json::Error> {
        let results = self
            .hits
            .into_iter()
            .map(SearchResult::from_hit)
            .collect::<Result<Vec<_>, _>>()?;
        let nb_hits = self.nb_hits.max(results.len() as u64);

        Ok(SearchResponse {
            results,
            nb_hits,
            hits_per_page: self.hits_per_page,
            page: self.page,
        })
    }
}
