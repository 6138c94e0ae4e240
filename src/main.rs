//! algolia-dropin: search API server for storefront front ends
//!
//! This is the main entry point for the application.

use algolia_dropin::{
    config,
    network::HttpClient,
    search::AlgoliaBackend,
    web::{create_router, AppState},
    AlgoliaSearch, InitializationState,
};
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Starting algolia-dropin v{}", algolia_dropin::VERSION);

    // Load configuration
    let settings = config::load_settings()?;

    // Initialize HTTP client and backend
    let client = HttpClient::with_settings(&settings.outgoing)?;
    let mut backend = AlgoliaBackend::new(client);
    if let Some(ref host) = settings.algolia.host {
        backend = backend.with_host(host.clone());
    }

    let source = Arc::new(settings.clone());
    let search = Arc::new(AlgoliaSearch::from_settings(
        &settings,
        source,
        Arc::new(backend),
    )?);

    // Set up search once; a missing configuration leaves search disabled
    match search.initialize().await {
        Ok(Some(_)) => info!("Search initialized"),
        Ok(None) => warn!("Search is disabled until Algolia credentials are configured"),
        Err(e) => error!("{}", e),
    }
    if let InitializationState::Failed(_) = search.state() {
        warn!("Serving with search unavailable; restart after fixing the configuration");
    }

    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );
    let app = create_router(AppState::new(settings, search));

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
