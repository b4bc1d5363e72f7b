use super::builder::{ConfigurationManagerBuilder, RefreshPolicy};
use super::errors::{ConfigurationManagerError, MetricsErrorKind};
use super::metrics::MetricsRecorder;
use super::refresh::RefreshState;
use super::validator::ConfigurationValidator;
use crate::clock::{self, Clock};
use crate::configuration::{AsBaseConfiguration, BaseConfiguration};
use crate::prelude::debug;
use crate::retriever::{ConfigurationRetriever, DocumentRetriever};
use arc_swap::ArcSwapOption;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Cached, periodically refreshed configuration retrieved from a metadata address.
///
/// The manager keeps the last successfully retrieved configuration and goes
/// back to the metadata address only when its refresh deadline has passed:
///
/// - Reads while the cache is fresh are lock-free and perform no I/O.
/// - At most one refresh runs at a time; concurrent callers wait for it and
///   share its result.
/// - A failed refresh never discards a cached configuration. The stale value
///   keeps being served and the next attempt is scheduled after
///   `min(automatic_refresh_interval, refresh_interval)`.
/// - A successful refresh schedules the next one after the automatic refresh
///   interval plus up to 60 minutes of random jitter.
///
/// Cloning the manager is cheap; clones share the same cache.
///
/// # Examples
///
/// ```no_run
/// use token_trust::retriever::OpenIdConnectConfigurationRetriever;
/// use token_trust::ConfigurationManager;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = ConfigurationManager::builder(
///     "https://login.example.com/.well-known/openid-configuration",
///     OpenIdConnectConfigurationRetriever,
/// )
/// .build()?;
///
/// let configuration = manager.get_configuration(&CancellationToken::new()).await?;
/// println!("issuer: {:?}", configuration.issuer());
///
/// // A token referenced an unknown key: ask for fresh keys on the next call.
/// manager.request_refresh();
/// # Ok(())
/// # }
/// ```
pub struct ConfigurationManager<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ConfigurationManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub(super) struct Inner<T> {
    address: String,

    // Collaborators.
    document_retriever: Arc<dyn DocumentRetriever>,
    configuration_retriever: Arc<dyn ConfigurationRetriever<T>>,
    validator: Option<Arc<dyn ConfigurationValidator<T>>>,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<dyn MetricsRecorder>>,

    policy: RefreshPolicy,

    // Last-known-good configuration. Replaced only by a successful refresh.
    current: ArcSwapOption<T>,

    // Scheduling state, in unix milliseconds.
    sync_after: AtomicI64,
    last_refresh: AtomicI64,
    last_refresh_request: AtomicI64,
    is_first_refresh_request: AtomicBool,
    // Honored refresh requests so far. A refresh compares it before and after
    // its fetch so a request made mid-fetch is not overwritten by the commit.
    refresh_requests: AtomicU64,

    // Single-flight lock. The guard is moved into the refresh task.
    refresh_lock: Arc<Mutex<RefreshState>>,
}

impl<T> Debug for ConfigurationManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        f.debug_struct("ConfigurationManager")
            .field("address", &inner.address)
            .field("document_retriever", &inner.document_retriever)
            .field("configuration_retriever", &inner.configuration_retriever)
            .field(
                "validator",
                &inner.validator.as_ref().map(|_| "<ConfigurationValidator>"),
            )
            .field("clock", &inner.clock)
            .field(
                "metrics",
                &inner.metrics.as_ref().map(|_| "<MetricsRecorder>"),
            )
            .field("policy", &inner.policy)
            .field("current", &"<ArcSwapOption<T>>")
            .field("sync_after", &inner.sync_after())
            .field("last_refresh", &inner.last_refresh())
            .field(
                "is_first_refresh_request",
                &inner.is_first_refresh_request.load(Ordering::Relaxed),
            )
            .field("refresh_lock", &"<Mutex<RefreshState>>")
            .finish()
    }
}

impl<T: Send + Sync + 'static> ConfigurationManager<T> {
    /// Creates a builder for a manager of the configuration at `address`.
    pub fn builder(
        address: impl Into<String>,
        configuration_retriever: impl ConfigurationRetriever<T>,
    ) -> ConfigurationManagerBuilder<T> {
        ConfigurationManagerBuilder::new(address, configuration_retriever)
    }

    /// Creates a manager with the default refresh policy.
    pub fn new(
        address: impl Into<String>,
        configuration_retriever: impl ConfigurationRetriever<T>,
        document_retriever: Arc<dyn DocumentRetriever>,
    ) -> Self {
        Self::from_parts(
            address.into(),
            document_retriever,
            Arc::new(configuration_retriever),
            None,
            RefreshPolicy::default(),
            Arc::new(crate::clock::SystemClock),
            None,
        )
    }

    pub(super) fn from_parts(
        address: String,
        document_retriever: Arc<dyn DocumentRetriever>,
        configuration_retriever: Arc<dyn ConfigurationRetriever<T>>,
        validator: Option<Arc<dyn ConfigurationValidator<T>>>,
        policy: RefreshPolicy,
        clock: Arc<dyn Clock>,
        metrics: Option<Arc<dyn MetricsRecorder>>,
    ) -> Self {
        let inner = Inner {
            address,
            document_retriever,
            configuration_retriever,
            validator,
            clock,
            metrics,
            policy,
            current: ArcSwapOption::empty(),
            sync_after: AtomicI64::new(clock::MIN_TIMESTAMP),
            last_refresh: AtomicI64::new(clock::MIN_TIMESTAMP),
            last_refresh_request: AtomicI64::new(clock::MIN_TIMESTAMP),
            is_first_refresh_request: AtomicBool::new(true),
            refresh_requests: AtomicU64::new(0),
            refresh_lock: Arc::new(Mutex::new(RefreshState::new())),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns the current configuration, refreshing it first if it is due.
    ///
    /// `cancel` only bounds the wait for a refresh that another caller already
    /// started. The refresh itself is shared by all waiters and always runs to
    /// completion, even if the caller that started it goes away.
    ///
    /// # Panics
    ///
    /// A refresh runs on a task spawned with [`tokio::spawn`], so this must be
    /// called from within a Tokio runtime. Calls served from a fresh cache never
    /// spawn.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationManagerError::Cancelled`] if `cancel` fires while waiting.
    /// - [`ConfigurationManagerError::NoConfigurationAvailable`] if no
    ///   configuration has ever been retrieved and the latest attempt failed.
    /// - [`ConfigurationManagerError::RefreshTask`] if the refresh task panicked.
    pub async fn get_configuration(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Arc<T>, ConfigurationManagerError> {
        if let Some(current) = self.inner.fresh_configuration() {
            return Ok(current);
        }

        let guard = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ConfigurationManagerError::Cancelled),
            guard = Arc::clone(&self.inner.refresh_lock).lock_owned() => guard,
        };

        let inner = Arc::clone(&self.inner);
        let refresh = tokio::spawn(async move { inner.refresh_if_due(guard).await });

        match refresh.await {
            Ok(result) => result,
            Err(e) => {
                self.inner.record_error(MetricsErrorKind::RefreshTaskFailed);
                Err(ConfigurationManagerError::RefreshTask(e))
            }
        }
    }

    /// Asks for the configuration to be retrieved again on the next
    /// [`get_configuration`](Self::get_configuration) call.
    ///
    /// Intended for callers that saw evidence of rotation, such as a token
    /// signed with an unknown key. The first request on a manager always takes
    /// effect; later requests are ignored until `refresh_interval` has elapsed
    /// since the last refresh or the last honored request. A manager with an
    /// infinite automatic refresh interval ignores all requests.
    ///
    /// This never performs I/O.
    pub fn request_refresh(&self) {
        let inner = &self.inner;
        if inner.policy.is_infinite() {
            return;
        }

        let now = inner.now_millis();
        let honored = if inner.is_first_refresh_request.swap(false, Ordering::AcqRel) {
            true
        } else {
            let last = inner
                .last_refresh
                .load(Ordering::Acquire)
                .max(inner.last_refresh_request.load(Ordering::Acquire));
            now >= clock::add_millis(last, inner.policy.refresh_interval())
        };

        if honored {
            debug!("Configuration refresh requested: address={}", inner.address);
            inner.last_refresh_request.store(now, Ordering::Release);
            inner.refresh_requests.fetch_add(1, Ordering::SeqCst);
            inner.sync_after.store(now, Ordering::SeqCst);
            if let Some(metrics) = inner.metrics.as_deref() {
                metrics.record_refresh_request();
            }
        }
    }

    /// Returns the cached configuration without refreshing it.
    pub fn current(&self) -> Option<Arc<T>> {
        self.inner.current.load_full()
    }

    /// Returns the metadata address.
    pub fn metadata_address(&self) -> &str {
        &self.inner.address
    }

    /// Returns the refresh policy.
    pub fn policy(&self) -> RefreshPolicy {
        self.inner.policy
    }

    /// Returns the earliest time at which the next refresh may happen.
    pub fn sync_after(&self) -> OffsetDateTime {
        self.inner.sync_after()
    }

    /// Returns the time of the last successful refresh.
    pub fn last_refresh(&self) -> OffsetDateTime {
        self.inner.last_refresh()
    }
}

impl<T: AsBaseConfiguration + Send + Sync + 'static> ConfigurationManager<T> {
    /// Like [`get_configuration`](Self::get_configuration), narrowed to the
    /// [`BaseConfiguration`] view.
    ///
    /// Returns `Ok(None)` if the configuration has no base view.
    ///
    /// # Errors
    ///
    /// Same as [`get_configuration`](Self::get_configuration).
    pub async fn get_base_configuration(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<BaseConfiguration>, ConfigurationManagerError> {
        let configuration = self.get_configuration(cancel).await?;
        Ok(configuration.as_base_configuration())
    }
}

impl<T> Inner<T> {
    pub(super) fn address(&self) -> &str {
        &self.address
    }

    pub(super) fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    pub(super) fn document_retriever(&self) -> &dyn DocumentRetriever {
        self.document_retriever.as_ref()
    }

    pub(super) fn configuration_retriever(&self) -> &dyn ConfigurationRetriever<T> {
        self.configuration_retriever.as_ref()
    }

    pub(super) fn validator(&self) -> Option<&dyn ConfigurationValidator<T>> {
        self.validator.as_deref()
    }

    pub(super) fn now_millis(&self) -> i64 {
        clock::to_unix_millis(self.clock.now())
    }

    pub(super) fn current(&self) -> Option<Arc<T>> {
        self.current.load_full()
    }

    fn fresh_configuration(&self) -> Option<Arc<T>> {
        let current = self.current.load_full()?;
        (self.now_millis() < self.sync_after.load(Ordering::Acquire)).then_some(current)
    }

    pub(super) fn is_refresh_due(&self, now: i64) -> bool {
        now >= self.sync_after.load(Ordering::Acquire)
    }

    /// Number of refresh requests honored so far.
    pub(super) fn refresh_requests(&self) -> u64 {
        self.refresh_requests.load(Ordering::SeqCst)
    }

    /// Publishes a new configuration. Must be called with the refresh lock held.
    pub(super) fn publish(&self, configuration: T, now: i64, next_sync: i64, requests_seen: u64) {
        self.current.store(Some(Arc::new(configuration)));
        self.last_refresh.store(now, Ordering::Release);
        self.reschedule(now, next_sync, requests_seen);
    }

    /// Schedules the next attempt. Must be called with the refresh lock held.
    ///
    /// `requests_seen` is the request count read before the fetch started. If a
    /// request was honored since then, the next call stays due.
    pub(super) fn reschedule(&self, now: i64, next_sync: i64, requests_seen: u64) {
        self.sync_after.store(next_sync, Ordering::SeqCst);
        if self.refresh_requests() != requests_seen {
            self.sync_after.store(now, Ordering::SeqCst);
        }
    }

    fn sync_after(&self) -> OffsetDateTime {
        clock::from_unix_millis(self.sync_after.load(Ordering::Acquire))
    }

    fn last_refresh(&self) -> OffsetDateTime {
        clock::from_unix_millis(self.last_refresh.load(Ordering::Acquire))
    }

    pub(super) fn record_refresh(&self) {
        if let Some(metrics) = self.metrics.as_deref() {
            metrics.record_refresh();
        }
    }

    pub(super) fn record_error(&self, kind: MetricsErrorKind) {
        if let Some(metrics) = self.metrics.as_deref() {
            metrics.record_error(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_manager::validator::ConfigurationValidationResult;
    use crate::config_manager::ConfigurationManagerError;
    use crate::constants::{INFINITE_REFRESH_INTERVAL, MAX_REFRESH_JITTER};
    use crate::retriever::{
        FetchError, InMemoryDocumentRetriever, JsonWebKeySetRetriever, RawDocumentRetriever,
        RetrieveError,
    };
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    const ADDRESS: &str = "mem://metadata";
    const HOUR: Duration = Duration::from_secs(3600);
    const MINUTE: Duration = Duration::from_secs(60);

    #[derive(Debug)]
    struct ManualClock(StdMutex<OffsetDateTime>);

    impl ManualClock {
        fn new() -> Arc<Self> {
            let start = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
            Arc::new(Self(StdMutex::new(start)))
        }

        fn advance(&self, d: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += d;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> OffsetDateTime {
            *self.0.lock().unwrap()
        }
    }

    #[derive(Default)]
    struct CountingMetrics {
        refreshes: AtomicUsize,
        requests: AtomicUsize,
        errors: StdMutex<Vec<MetricsErrorKind>>,
    }

    impl MetricsRecorder for CountingMetrics {
        fn record_refresh(&self) {
            self.refreshes.fetch_add(1, Ordering::Relaxed);
        }

        fn record_refresh_request(&self) {
            self.requests.fetch_add(1, Ordering::Relaxed);
        }

        fn record_error(&self, kind: MetricsErrorKind) {
            self.errors.lock().unwrap().push(kind);
        }
    }

    /// Holds every fetch until the test releases it.
    #[derive(Debug)]
    struct GatedDocuments {
        body: StdMutex<Option<&'static str>>,
        entered: Notify,
        release: Notify,
        requests: AtomicUsize,
    }

    impl GatedDocuments {
        fn new(body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                body: StdMutex::new(Some(body)),
                entered: Notify::new(),
                release: Notify::new(),
                requests: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DocumentRetriever for GatedDocuments {
        async fn get_document(
            &self,
            address: &str,
            _cancel: &CancellationToken,
        ) -> Result<String, FetchError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            let body = *self.body.lock().unwrap();
            body.map(str::to_owned)
                .ok_or_else(|| FetchError::NotFound(address.to_owned()))
        }
    }

    struct Fixture {
        manager: ConfigurationManager<String>,
        documents: Arc<InMemoryDocumentRetriever>,
        clock: Arc<ManualClock>,
    }

    fn fixture_with_policy(policy: RefreshPolicy) -> Fixture {
        let documents = Arc::new(InMemoryDocumentRetriever::new().with_document(ADDRESS, "v1"));
        let clock = ManualClock::new();
        let manager = ConfigurationManager::builder(ADDRESS, RawDocumentRetriever)
            .document_retriever(documents.clone())
            .clock(clock.clone())
            .refresh_policy(policy)
            .build()
            .unwrap();
        Fixture {
            manager,
            documents,
            clock,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_policy(RefreshPolicy::default())
    }

    async fn get(
        manager: &ConfigurationManager<String>,
    ) -> Result<Arc<String>, ConfigurationManagerError> {
        manager.get_configuration(&CancellationToken::new()).await
    }

    fn millis(t: OffsetDateTime) -> i64 {
        clock::to_unix_millis(t)
    }

    #[tokio::test]
    async fn first_access_fetches() {
        let f = fixture();
        assert!(f.manager.current().is_none());

        let configuration = get(&f.manager).await.unwrap();
        assert_eq!(configuration.as_str(), "v1");
        assert_eq!(f.documents.request_count(), 1);
        assert_eq!(f.manager.last_refresh(), f.clock.now());
    }

    #[tokio::test]
    async fn fresh_cache_performs_no_io() {
        let f = fixture();
        get(&f.manager).await.unwrap();

        f.clock.advance(HOUR);
        for _ in 0..10 {
            assert_eq!(get(&f.manager).await.unwrap().as_str(), "v1");
        }
        assert_eq!(f.documents.request_count(), 1);
    }

    #[tokio::test]
    async fn next_refresh_is_jittered_within_bounds() {
        let f = fixture();
        let t = f.clock.now();
        get(&f.manager).await.unwrap();

        let sync_after = millis(f.manager.sync_after());
        let earliest = millis(t + 12 * HOUR);
        let latest = millis(t + 12 * HOUR + MAX_REFRESH_JITTER);
        assert!(sync_after >= earliest, "sync_after before interval");
        assert!(sync_after < latest, "sync_after beyond jitter");
    }

    #[tokio::test]
    async fn refreshes_once_due() {
        let f = fixture();
        get(&f.manager).await.unwrap();

        f.documents.insert(ADDRESS, "v2");
        f.clock.advance(13 * HOUR + MINUTE);
        assert_eq!(get(&f.manager).await.unwrap().as_str(), "v2");
        assert_eq!(f.documents.request_count(), 2);
    }

    #[tokio::test]
    async fn stale_configuration_is_served_when_refresh_fails() {
        let f = fixture();
        get(&f.manager).await.unwrap();
        let refreshed_at = f.manager.last_refresh();

        f.documents.remove(ADDRESS);
        f.clock.advance(14 * HOUR);
        let now = f.clock.now();

        assert_eq!(get(&f.manager).await.unwrap().as_str(), "v1");
        assert_eq!(f.documents.request_count(), 2);
        assert_eq!(f.manager.sync_after(), now + 5 * MINUTE);
        assert_eq!(f.manager.last_refresh(), refreshed_at);

        // Within the backoff window the stale value is served without I/O.
        f.clock.advance(MINUTE);
        assert_eq!(get(&f.manager).await.unwrap().as_str(), "v1");
        assert_eq!(f.documents.request_count(), 2);
    }

    #[tokio::test]
    async fn first_fetch_failure_is_fatal() {
        let f = fixture();
        f.documents.remove(ADDRESS);

        let err = get(&f.manager).await.unwrap_err();
        match err {
            ConfigurationManagerError::NoConfigurationAvailable { address, source } => {
                assert_eq!(address, ADDRESS);
                let source = source.expect("retrieval error is attached");
                assert!(matches!(
                    source.as_ref(),
                    RetrieveError::Fetch(FetchError::NotFound(_))
                ));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Recovers once the source is back and the backoff has elapsed.
        f.documents.insert(ADDRESS, "v1");
        f.clock.advance(5 * MINUTE);
        assert_eq!(get(&f.manager).await.unwrap().as_str(), "v1");
    }

    #[tokio::test]
    async fn failed_validation_still_caches() {
        let metrics = Arc::new(CountingMetrics::default());
        let documents = Arc::new(InMemoryDocumentRetriever::new().with_document(ADDRESS, "v1"));
        let manager = ConfigurationManager::builder(ADDRESS, RawDocumentRetriever)
            .document_retriever(documents)
            .validator(|_: &String| ConfigurationValidationResult::failure("not trusted"))
            .metrics(metrics.clone())
            .build()
            .unwrap();

        assert_eq!(get(&manager).await.unwrap().as_str(), "v1");
        assert_eq!(
            *metrics.errors.lock().unwrap(),
            vec![MetricsErrorKind::ValidationFailed]
        );
        assert_eq!(metrics.refreshes.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn first_refresh_request_always_takes_effect() {
        let f = fixture();
        get(&f.manager).await.unwrap();

        f.manager.request_refresh();
        assert_eq!(f.manager.sync_after(), f.clock.now());

        f.documents.insert(ADDRESS, "v2");
        assert_eq!(get(&f.manager).await.unwrap().as_str(), "v2");
    }

    #[tokio::test]
    async fn refresh_requests_are_rate_limited() {
        let f = fixture();
        get(&f.manager).await.unwrap();

        f.manager.request_refresh();
        get(&f.manager).await.unwrap();
        let scheduled = f.manager.sync_after();

        f.clock.advance(MINUTE);
        f.manager.request_refresh();
        assert_eq!(f.manager.sync_after(), scheduled);

        f.clock.advance(4 * MINUTE);
        f.manager.request_refresh();
        assert_eq!(f.manager.sync_after(), f.clock.now());
    }

    #[tokio::test]
    async fn rate_limit_counts_from_last_honored_request() {
        let f = fixture();
        get(&f.manager).await.unwrap();

        f.clock.advance(10 * MINUTE);
        f.manager.request_refresh();
        let requested = f.manager.sync_after();
        assert_eq!(requested, f.clock.now());

        // Five minutes have passed since the refresh, but not since the request.
        f.clock.advance(MINUTE);
        f.manager.request_refresh();
        assert_eq!(f.manager.sync_after(), requested);

        f.clock.advance(4 * MINUTE);
        f.manager.request_refresh();
        assert_eq!(f.manager.sync_after(), f.clock.now());
        assert_eq!(f.documents.request_count(), 1);
    }

    #[tokio::test]
    async fn request_during_refresh_is_not_lost() {
        let documents = GatedDocuments::new("v1");
        let manager = ConfigurationManager::builder(ADDRESS, RawDocumentRetriever)
            .document_retriever(documents.clone())
            .clock(ManualClock::new())
            .build()
            .unwrap();

        let first = tokio::spawn({
            let manager = manager.clone();
            async move { get(&manager).await }
        });
        documents.entered.notified().await;

        manager.request_refresh();
        documents.release.notify_one();
        assert_eq!(first.await.unwrap().unwrap().as_str(), "v1");
        assert!(manager.sync_after() <= manager.last_refresh());

        *documents.body.lock().unwrap() = Some("v2");
        documents.release.notify_one();
        assert_eq!(get(&manager).await.unwrap().as_str(), "v2");
        assert_eq!(documents.requests.load(Ordering::SeqCst), 2);

        // The follow-up fetch consumed the request; the cache is fresh again.
        assert!(manager.sync_after() > manager.last_refresh());
    }

    #[tokio::test]
    async fn request_during_failed_refresh_is_not_lost() {
        let documents = GatedDocuments::new("v1");
        let clock = ManualClock::new();
        let manager = ConfigurationManager::builder(ADDRESS, RawDocumentRetriever)
            .document_retriever(documents.clone())
            .clock(clock.clone())
            .build()
            .unwrap();

        documents.release.notify_one();
        get(&manager).await.unwrap();
        documents.entered.notified().await;

        *documents.body.lock().unwrap() = None;
        clock.advance(13 * HOUR);
        let stale = tokio::spawn({
            let manager = manager.clone();
            async move { get(&manager).await }
        });
        documents.entered.notified().await;

        manager.request_refresh();
        documents.release.notify_one();
        assert_eq!(stale.await.unwrap().unwrap().as_str(), "v1");
        assert_eq!(manager.sync_after(), clock.now());

        *documents.body.lock().unwrap() = Some("v2");
        documents.release.notify_one();
        assert_eq!(get(&manager).await.unwrap().as_str(), "v2");
        assert_eq!(documents.requests.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn infinite_interval_ignores_refresh_requests() {
        let policy = RefreshPolicy::new()
            .with_automatic_refresh_interval(INFINITE_REFRESH_INTERVAL)
            .unwrap();
        let f = fixture_with_policy(policy);
        get(&f.manager).await.unwrap();
        let scheduled = f.manager.sync_after();

        f.manager.request_refresh();
        assert_eq!(f.manager.sync_after(), scheduled);

        f.clock.advance(1_000 * HOUR);
        get(&f.manager).await.unwrap();
        assert_eq!(f.documents.request_count(), 1);
    }

    #[tokio::test]
    async fn cancellation_only_bounds_the_wait() {
        let f = fixture();
        let _held = Arc::clone(&f.manager.inner.refresh_lock).lock_owned().await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = f.manager.get_configuration(&cancel).await.unwrap_err();
        assert!(matches!(err, ConfigurationManagerError::Cancelled));
        assert_eq!(f.documents.request_count(), 0);
    }

    #[tokio::test]
    async fn base_configuration_view() {
        let documents = Arc::new(InMemoryDocumentRetriever::new().with_document(
            ADDRESS,
            r#"{"keys":[{"kty":"oct","kid":"k1","k":"c2VjcmV0"}]}"#,
        ));
        let manager = ConfigurationManager::builder(ADDRESS, JsonWebKeySetRetriever)
            .document_retriever(documents)
            .build()
            .unwrap();

        let base = manager
            .get_base_configuration(&CancellationToken::new())
            .await
            .unwrap()
            .expect("key sets have a base view");
        assert_eq!(base.signing_keys().len(), 1);
        assert_eq!(base.issuer(), None);
    }

    #[tokio::test]
    async fn metrics_track_refreshes_and_requests() {
        let metrics = Arc::new(CountingMetrics::default());
        let documents = Arc::new(InMemoryDocumentRetriever::new());
        let manager = ConfigurationManager::builder(ADDRESS, RawDocumentRetriever)
            .document_retriever(documents.clone())
            .metrics(metrics.clone())
            .build()
            .unwrap();

        assert!(get(&manager).await.is_err());
        assert_eq!(
            *metrics.errors.lock().unwrap(),
            vec![
                MetricsErrorKind::Fetch,
                MetricsErrorKind::NoConfigurationAvailable
            ]
        );

        manager.request_refresh();
        documents.insert(ADDRESS, "v1");
        get(&manager).await.unwrap();
        assert_eq!(metrics.requests.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.refreshes.load(Ordering::Relaxed), 1);
    }
}
