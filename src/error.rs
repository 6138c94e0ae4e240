//! Error types for the search adapter

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to the remote search service.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("search HTTP error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("search service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode search response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("search request timed out after {0:?}")]
    Timeout(Duration),
}

impl RequestError {
    /// Map a reqwest failure, keeping timeouts distinct
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            RequestError::Timeout(timeout)
        } else {
            RequestError::Transport(err)
        }
    }

    /// Whether the service rejected the credentials
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, RequestError::Status { status: 401 | 403, .. })
    }
}

/// Errors surfaced by the search client, initializer and facade.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search configuration is missing: {}", .fields.join(", "))]
    ConfigurationMissing { fields: Vec<&'static str> },
    #[error("search configuration is invalid: {0}")]
    ConfigurationInvalid(String),
    #[error("search client used before successful initialization")]
    NotInitialized,
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl SearchError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        SearchError::ConfigurationInvalid(reason.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::ConfigurationMissing { .. } => ErrorKind::ConfigurationMissing,
            SearchError::ConfigurationInvalid(_) => ErrorKind::ConfigurationInvalid,
            SearchError::NotInitialized => ErrorKind::NotInitialized,
            SearchError::Request(RequestError::Timeout(_)) => ErrorKind::Timeout,
            SearchError::Request(_) => ErrorKind::Request,
        }
    }

    /// Transient failures the caller may choose to retry
    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::Request | ErrorKind::Timeout)
    }
}

/// Coarse error taxonomy. `Timeout` is a kind of request failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigurationMissing,
    ConfigurationInvalid,
    NotInitialized,
    Request,
    Timeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConfigurationMissing => "configuration_missing",
            Self::ConfigurationInvalid => "configuration_invalid",
            Self::NotInitialized => "not_initialized",
            Self::Request => "request",
            Self::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// Initialization failure shared by every caller of the same initializer.
#[derive(Debug, Clone)]
pub struct InitError(Arc<SearchError>);

impl InitError {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind()
    }

    pub fn error(&self) -> &SearchError {
        &self.0
    }

    /// Whether two handles refer to the same recorded failure
    pub fn same_failure(&self, other: &InitError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<SearchError> for InitError {
    fn from(err: SearchError) -> Self {
        InitError(Arc::new(err))
    }
}

impl From<RequestError> for InitError {
    fn from(err: RequestError) -> Self {
        InitError(Arc::new(SearchError::Request(err)))
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "search initialization failed: {}", self.0)
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}
