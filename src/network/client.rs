//! HTTP client for talking to the hosted search service

use super::agent::{accept_json, algolia_agent};
use crate::config::OutgoingSettings;
use crate::error::RequestError;
use anyhow::Result;
use reqwest::Client;
use std::time::Duration;

/// HTTP response from the search service
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
}

impl HttpResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, RequestError> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into a status error
    pub fn error_for_status(self) -> Result<Self, RequestError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(RequestError::Status {
                status: self.status,
                body: self.text,
            })
        }
    }
}

/// HTTP client wrapper with outgoing settings applied
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    user_agent: String,
    extra_headers: Vec<(String, String)>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let timeout = settings.request_timeout()?;
        let mut builder = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            default_timeout: timeout,
            user_agent: algolia_agent(),
            extra_headers: settings
                .extra_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    /// Default per-request timeout
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// POST a JSON body and collect the response
    pub async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        params: &[(&str, &str)],
        body: &serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, RequestError> {
        let timeout = timeout.unwrap_or(self.default_timeout);

        let mut req_builder = self
            .client
            .post(url)
            .timeout(timeout)
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept_json());

        for (key, value) in &self.extra_headers {
            req_builder = req_builder.header(key, value);
        }
        for (key, value) in headers {
            req_builder = req_builder.header(*key, *value);
        }
        if !params.is_empty() {
            req_builder = req_builder.query(params);
        }

        let response = req_builder
            .json(body)
            .send()
            .await
            .map_err(|e| RequestError::from_reqwest(e, timeout))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| RequestError::from_reqwest(e, timeout))?;

        Ok(HttpResponse { status, text })
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
