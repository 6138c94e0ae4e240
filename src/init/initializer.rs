//! One-time search client setup shared by every caller

use super::single_flight::{FlightStatus, SingleFlight};
use crate::config::{ConfigSource, Settings};
use crate::error::{InitError, RequestError, SearchError};
use crate::search::{ClientHandle, SearchBackend, SearchClient, SearchConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Settled result of initialization. `Ok(None)` means search is disabled
/// because the credentials are not configured.
pub type InitOutcome = Result<Option<ClientHandle>, InitError>;

/// Setup behavior
#[derive(Debug, Clone, Copy)]
pub struct InitOptions {
    /// Upper bound on the whole setup sequence
    pub setup_timeout: Duration,
    /// Probe the service with the credentials before reporting ready
    pub verify: bool,
}

impl InitOptions {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            setup_timeout: settings.outgoing.init_timeout()?,
            verify: settings.algolia.verify_on_init,
        })
    }
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            setup_timeout: Duration::from_secs(10),
            verify: false,
        }
    }
}

/// Lifecycle of an initializer
#[derive(Debug, Clone)]
pub enum InitializationState {
    Uninitialized,
    InFlight,
    Ready(ClientHandle),
    /// Settled without credentials; search is switched off
    Disabled,
    Failed(InitError),
}

impl InitializationState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::InFlight => "in_flight",
            Self::Ready(_) => "ready",
            Self::Disabled => "disabled",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Disabled | Self::Failed(_))
    }
}

/// Configures a `SearchClient` at most once and shares the outcome.
///
/// Failures are permanent for the instance; build a new initializer to try
/// again.
pub struct SearchInitializer {
    source: Arc<dyn ConfigSource>,
    backend: Arc<dyn SearchBackend>,
    options: InitOptions,
    flight: SingleFlight<InitOutcome>,
}

impl SearchInitializer {
    pub fn new(source: Arc<dyn ConfigSource>, backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            source,
            backend,
            options: InitOptions::default(),
            flight: SingleFlight::new(),
        }
    }

    pub fn with_options(mut self, options: InitOptions) -> Self {
        self.options = options;
        self
    }

    /// Run setup once; every caller receives the same outcome
    pub async fn initialize(&self) -> InitOutcome {
        let source = self.source.clone();
        let backend = self.backend.clone();
        let options = self.options;
        self.flight
            .run(move || bounded_setup(source, backend, options))
            .await
    }

    /// Like `initialize`, but stop waiting after `wait`.
    ///
    /// Giving up does not affect the shared state; the setup keeps running
    /// for other callers.
    pub async fn initialize_within(&self, wait: Duration) -> InitOutcome {
        tokio::time::timeout(wait, self.initialize())
            .await
            .unwrap_or_else(|_| Err(RequestError::Timeout(wait).into()))
    }

    pub fn state(&self) -> InitializationState {
        match self.flight.status() {
            FlightStatus::Idle => InitializationState::Uninitialized,
            FlightStatus::Running => InitializationState::InFlight,
            FlightStatus::Done(Ok(Some(handle))) => InitializationState::Ready(handle),
            FlightStatus::Done(Ok(None)) => InitializationState::Disabled,
            FlightStatus::Done(Err(err)) => InitializationState::Failed(err),
        }
    }

    /// The configured client, once ready
    pub fn handle(&self) -> Option<ClientHandle> {
        match self.flight.get() {
            Some(Ok(handle)) => handle,
            _ => None,
        }
    }

    /// The config the client was set up with, once ready
    pub fn config(&self) -> Option<SearchConfig> {
        self.handle().and_then(|client| client.config().cloned())
    }
}

async fn bounded_setup(
    source: Arc<dyn ConfigSource>,
    backend: Arc<dyn SearchBackend>,
    options: InitOptions,
) -> InitOutcome {
    match tokio::time::timeout(options.setup_timeout, setup(source, backend, options)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            error!(
                "Search initialization did not finish within {:?}",
                options.setup_timeout
            );
            Err(RequestError::Timeout(options.setup_timeout).into())
        }
    }
}

async fn setup(
    source: Arc<dyn ConfigSource>,
    backend: Arc<dyn SearchBackend>,
    options: InitOptions,
) -> InitOutcome {
    let config = match SearchConfig::from_source(source.as_ref()) {
        Ok(config) => config,
        Err(SearchError::ConfigurationMissing { fields }) => {
            warn!(
                "Algolia configuration is missing ({}), search is disabled",
                fields.join(", ")
            );
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let index = config.index_name.clone();
    let client = SearchClient::new(backend);
    client.configure(config)?;

    if options.verify {
        client
            .verify(Some(options.setup_timeout))
            .await
            .map_err(|e| match e {
                SearchError::Request(ref req) if req.is_auth_rejection() => {
                    SearchError::invalid(format!("credentials rejected by search service: {}", req))
                }
                other => other,
            })
            .map_err(|e| {
                error!("Search credential check failed: {}", e);
                InitError::from(e)
            })?;
    }

    info!("Search client ready for index {}", index);
    Ok(Some(Arc::new(client)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KEY_API_KEY, KEY_APPLICATION_ID, KEY_INDEX_NAME};
    use crate::error::ErrorKind;
    use crate::search::StubBackend;
    use futures::future::join_all;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    struct CountingSource {
        values: HashMap<String, String>,
        reads: AtomicUsize,
    }

    impl CountingSource {
        fn new(pairs: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                values: pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                reads: AtomicUsize::new(0),
            })
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl ConfigSource for CountingSource {
        fn get_config_value(&self, key: &str) -> Option<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.values.get(key).cloned()
        }
    }

    fn configured() -> Arc<CountingSource> {
        CountingSource::new(&[
            (KEY_APPLICATION_ID, "APP"),
            (KEY_API_KEY, "KEY"),
            (KEY_INDEX_NAME, "catalog"),
        ])
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_options_from_settings() {
        let mut settings = Settings::default();
        settings.algolia.verify_on_init = true;
        settings.outgoing.init_timeout = 2.5;
        let options = InitOptions::from_settings(&settings).unwrap();
        assert_eq!(options.setup_timeout, Duration::from_millis(2500));
        assert!(options.verify);

        settings.outgoing.init_timeout = -1.0;
        assert!(InitOptions::from_settings(&settings).is_err());
    }

    #[tokio::test]
    async fn test_concurrent_initialize_runs_setup_once() {
        let source = configured();
        let backend = Arc::new(StubBackend {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let initializer = SearchInitializer::new(source.clone(), backend.clone()).with_options(
            InitOptions {
                verify: true,
                ..Default::default()
            },
        );

        let outcomes = join_all((0..10).map(|_| initializer.initialize())).await;

        let first = outcomes[0].as_ref().unwrap().as_ref().unwrap();
        for outcome in &outcomes {
            let handle = outcome.as_ref().unwrap().as_ref().unwrap();
            assert!(Arc::ptr_eq(first, handle));
        }
        assert_eq!(source.reads(), 3);
        assert_eq!(backend.calls(), 1);
        assert!(matches!(initializer.state(), InitializationState::Ready(_)));
    }

    #[tokio::test]
    async fn test_missing_credentials_disable_search_with_warning() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let source = CountingSource::new(&[(KEY_APPLICATION_ID, "APP"), (KEY_API_KEY, "")]);
        let backend = Arc::new(StubBackend::default());
        let initializer = SearchInitializer::new(source, backend.clone()).with_options(
            InitOptions {
                verify: true,
                ..Default::default()
            },
        );

        let outcome = initializer.initialize().await.unwrap();

        assert!(outcome.is_none());
        assert!(matches!(initializer.state(), InitializationState::Disabled));
        assert_eq!(backend.calls(), 0);
        assert!(logs.contents().contains("Algolia configuration is missing"));
        assert!(logs.contents().contains("algolia.apiKey"));
    }

    #[tokio::test]
    async fn test_config_is_unset_until_ready() {
        let initializer = SearchInitializer::new(configured(), Arc::new(StubBackend::default()));
        assert!(initializer.config().is_none());
        assert!(matches!(
            initializer.state(),
            InitializationState::Uninitialized
        ));

        initializer.initialize().await.unwrap();

        assert_eq!(
            initializer.config(),
            Some(SearchConfig::new("APP", "KEY", "catalog"))
        );
    }

    #[tokio::test]
    async fn test_settled_outcome_is_cached() {
        let source = configured();
        let backend = Arc::new(StubBackend::default());
        let initializer = SearchInitializer::new(source.clone(), backend.clone()).with_options(
            InitOptions {
                verify: true,
                ..Default::default()
            },
        );

        let first = initializer.initialize().await.unwrap().unwrap();
        let reads = source.reads();
        let second = initializer.initialize().await.unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.reads(), reads);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_disabled_outcome_is_cached() {
        let source = CountingSource::new(&[]);
        let initializer = SearchInitializer::new(source.clone(), Arc::new(StubBackend::default()));

        assert!(initializer.initialize().await.unwrap().is_none());
        let reads = source.reads();
        assert!(initializer.initialize().await.unwrap().is_none());
        assert_eq!(source.reads(), reads);
    }

    #[tokio::test]
    async fn test_rejected_credentials_fail_permanently() {
        let backend = Arc::new(StubBackend {
            fail_status: Some(403),
            ..Default::default()
        });
        let initializer = SearchInitializer::new(configured(), backend.clone()).with_options(
            InitOptions {
                verify: true,
                ..Default::default()
            },
        );

        let err = initializer.initialize().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationInvalid);

        let again = initializer.initialize().await.unwrap_err();
        assert!(err.same_failure(&again));
        assert_eq!(backend.calls(), 1);
        assert!(initializer.handle().is_none());
        assert!(matches!(initializer.state(), InitializationState::Failed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_as_request_error() {
        let backend = Arc::new(StubBackend {
            fail_status: Some(500),
            ..Default::default()
        });
        let initializer = SearchInitializer::new(configured(), backend).with_options(InitOptions {
            verify: true,
            ..Default::default()
        });

        let err = initializer.initialize().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Request);
    }

    #[tokio::test]
    async fn test_stuck_setup_settles_as_timeout() {
        let backend = Arc::new(StubBackend {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let initializer = SearchInitializer::new(configured(), backend).with_options(InitOptions {
            setup_timeout: Duration::from_millis(30),
            verify: true,
        });

        let outcomes = join_all((0..3).map(|_| initializer.initialize())).await;

        for outcome in outcomes {
            assert_eq!(outcome.unwrap_err().kind(), ErrorKind::Timeout);
        }
        assert!(initializer.state().is_settled());
    }

    #[tokio::test]
    async fn test_caller_wait_bound_leaves_state_in_flight() {
        let backend = Arc::new(StubBackend {
            delay: Some(Duration::from_millis(100)),
            ..Default::default()
        });
        let initializer = SearchInitializer::new(configured(), backend).with_options(InitOptions {
            verify: true,
            ..Default::default()
        });

        let err = initializer
            .initialize_within(Duration::from_millis(10))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(matches!(initializer.state(), InitializationState::InFlight));

        assert!(initializer.initialize().await.unwrap().is_some());
    }
}
