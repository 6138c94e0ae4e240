//! HTTP networking module
//!
//! Provides the HTTP client used to reach the hosted search service.

mod agent;
mod client;

pub use agent::algolia_agent;
pub use client::{HttpClient, HttpResponse};
