//! Client identification strings

/// Value sent as `x-algolia-agent` and as the User-Agent header
pub fn algolia_agent() -> String {
    format!(
        "Algolia for Rust (algolia-dropin {}); reqwest",
        crate::VERSION
    )
}

/// Standard accept header for JSON requests
pub fn accept_json() -> &'static str {
    "application/json"
}
