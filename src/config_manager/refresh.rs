use super::errors::{ConfigurationManagerError, MetricsErrorKind};
use super::manager::Inner;
use crate::clock;
use crate::constants::MAX_REFRESH_JITTER;
use crate::prelude::{debug, info, warn};
use crate::retriever::{FetchError, RetrieveError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;

/// Maximum number of consecutive identical refresh failures logged at WARN.
const MAX_CONSECUTIVE_SAME_ERROR: u32 = 3;

/// Failure cause used to decide whether a refresh failure repeats the previous one.
///
/// HTTP statuses are keyed by code, so a `503` following a `500` is logged at
/// WARN again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ErrorKey {
    Address,
    Status(u16),
    Transport,
    Io,
    NotFound,
    Cancelled,
    Parse,
}

impl ErrorKey {
    pub(super) fn for_retrieve_error(error: &RetrieveError) -> Self {
        let RetrieveError::Fetch(fetch) = error else {
            return Self::Parse;
        };
        match fetch {
            FetchError::Status { status, .. } => Self::Status(*status),
            FetchError::HttpsRequired(_) => Self::Address,
            FetchError::Io { .. } => Self::Io,
            FetchError::NotFound(_) => Self::NotFound,
            FetchError::Cancelled => Self::Cancelled,
            #[cfg(feature = "http")]
            FetchError::InvalidAddress { .. } => Self::Address,
            #[cfg(feature = "http")]
            FetchError::Http { .. } | FetchError::Client(_) => Self::Transport,
        }
    }
}

/// Counts consecutive refresh failures with the same [`ErrorKey`].
///
/// The first `max_warnings` failures of a run are logged at WARN, the rest at
/// DEBUG. A different key starts a new run. The total since the last success
/// is kept separately for the recovery message.
#[derive(Debug)]
pub(super) struct ErrorTracker {
    last_key: Option<ErrorKey>,
    run_length: u32,
    failures_since_success: u32,
    max_warnings: u32,
}

impl ErrorTracker {
    pub(super) fn new(max_warnings: u32) -> Self {
        Self {
            last_key: None,
            run_length: 0,
            failures_since_success: 0,
            max_warnings,
        }
    }

    /// Records a failure and returns whether it should be logged at WARN.
    pub(super) fn record_error(&mut self, key: ErrorKey) -> bool {
        self.failures_since_success = self.failures_since_success.saturating_add(1);
        if self.last_key == Some(key) {
            self.run_length = self.run_length.saturating_add(1);
        } else {
            self.last_key = Some(key);
            self.run_length = 1;
        }
        self.run_length <= self.max_warnings
    }

    pub(super) fn reset(&mut self) {
        self.last_key = None;
        self.run_length = 0;
        self.failures_since_success = 0;
    }

    pub(super) fn run_length(&self) -> u32 {
        self.run_length
    }

    pub(super) fn failures_since_success(&self) -> u32 {
        self.failures_since_success
    }
}

/// State owned by whoever holds the refresh lock.
#[derive(Debug)]
pub(super) struct RefreshState {
    last_fetch_error: Option<Arc<RetrieveError>>,
    error_tracker: ErrorTracker,
}

impl RefreshState {
    pub(super) fn new() -> Self {
        Self {
            last_fetch_error: None,
            error_tracker: ErrorTracker::new(MAX_CONSECUTIVE_SAME_ERROR),
        }
    }
}

/// Random delay in `[0, MAX_REFRESH_JITTER)` added to the automatic refresh interval.
pub(super) fn refresh_jitter() -> Duration {
    let max_ms = u64::try_from(MAX_REFRESH_JITTER.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(fastrand::u64(0..max_ms))
}

impl<T: Send + Sync + 'static> Inner<T> {
    /// Refreshes the configuration if it is still due, then resolves the result.
    ///
    /// Runs on its own task with the refresh lock held for its whole duration, so
    /// a caller that stops waiting cannot interrupt it.
    pub(super) async fn refresh_if_due(
        &self,
        mut state: OwnedMutexGuard<RefreshState>,
    ) -> Result<Arc<T>, ConfigurationManagerError> {
        let now = self.now_millis();
        if self.is_refresh_due(now) {
            let requests_seen = self.refresh_requests();
            // The fetch is shared by every waiter; it is never cancelled.
            let fetch_cancel = CancellationToken::new();
            let result = self
                .configuration_retriever()
                .get_configuration(self.address(), self.document_retriever(), &fetch_cancel)
                .await;

            // Timestamps are taken after the fetch so slow sources do not eat into the interval.
            let now = self.now_millis();
            match result {
                Ok(configuration) => {
                    self.commit_success(&mut state, configuration, now, requests_seen);
                }
                Err(e) => self.commit_failure(&mut state, e, now, requests_seen),
            }
        } else {
            debug!(
                "Configuration already refreshed by another caller: address={}",
                self.address()
            );
        }

        self.resolve(&state)
    }

    fn commit_success(
        &self,
        state: &mut RefreshState,
        configuration: T,
        now: i64,
        requests_seen: u64,
    ) {
        if let Some(validator) = self.validator() {
            let result = validator.validate(&configuration);
            if !result.succeeded() {
                warn!(
                    "Retrieved configuration failed validation; using it anyway: address={}, error={}",
                    self.address(),
                    result.error_message().unwrap_or("unspecified")
                );
                self.record_error(MetricsErrorKind::ValidationFailed);
            }
        }

        let interval = self
            .policy()
            .automatic_refresh_interval()
            .saturating_add(refresh_jitter());
        let next_sync = clock::add_millis(now, interval);

        self.publish(configuration, now, next_sync, requests_seen);

        if state.error_tracker.failures_since_success() > 0 {
            info!(
                "Configuration refresh recovered after {} consecutive failures: address={}",
                state.error_tracker.failures_since_success(),
                self.address()
            );
        } else {
            debug!("Configuration refreshed: address={}", self.address());
        }
        state.error_tracker.reset();
        state.last_fetch_error = None;
        self.record_refresh();
    }

    fn commit_failure(
        &self,
        state: &mut RefreshState,
        error: RetrieveError,
        now: i64,
        requests_seen: u64,
    ) {
        let backoff = self.policy().failure_backoff();
        self.reschedule(now, clock::add_millis(now, backoff), requests_seen);

        let has_cached = self.current().is_some();
        if state
            .error_tracker
            .record_error(ErrorKey::for_retrieve_error(&error))
        {
            warn!(
                "Failed to refresh configuration: address={}, error={}, retry_in_ms={}, serving_stale={}",
                self.address(),
                error,
                backoff.as_millis(),
                has_cached
            );
        } else {
            debug!(
                "Failed to refresh configuration (repeated): address={}, error={}, retry_in_ms={}, consecutive_failures={}",
                self.address(),
                error,
                backoff.as_millis(),
                state.error_tracker.run_length()
            );
        }

        self.record_error(MetricsErrorKind::for_retrieve_error(&error));
        state.last_fetch_error = Some(Arc::new(error));
    }

    fn resolve(&self, state: &RefreshState) -> Result<Arc<T>, ConfigurationManagerError> {
        match self.current() {
            Some(current) => Ok(current),
            None => {
                self.record_error(MetricsErrorKind::NoConfigurationAvailable);
                Err(ConfigurationManagerError::NoConfigurationAvailable {
                    address: self.address().to_owned(),
                    source: state.last_fetch_error.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::ParseError;

    fn status(code: u16) -> RetrieveError {
        RetrieveError::Fetch(FetchError::Status {
            address: "https://login.example.com".to_owned(),
            status: code,
        })
    }

    #[test]
    fn tracker_downgrades_after_max_warnings() {
        let mut tracker = ErrorTracker::new(3);
        assert!(tracker.record_error(ErrorKey::NotFound));
        assert!(tracker.record_error(ErrorKey::NotFound));
        assert!(tracker.record_error(ErrorKey::NotFound));
        assert!(!tracker.record_error(ErrorKey::NotFound));
        assert_eq!(tracker.run_length(), 4);
    }

    #[test]
    fn tracker_starts_new_run_on_new_key() {
        let mut tracker = ErrorTracker::new(1);
        assert!(tracker.record_error(ErrorKey::Transport));
        assert!(!tracker.record_error(ErrorKey::Transport));
        assert!(tracker.record_error(ErrorKey::Parse));
        assert_eq!(tracker.run_length(), 1);
        assert_eq!(tracker.failures_since_success(), 3);

        tracker.reset();
        assert_eq!(tracker.failures_since_success(), 0);
        assert!(tracker.record_error(ErrorKey::Parse));
    }

    #[test]
    fn status_codes_are_distinct_keys() {
        let mut tracker = ErrorTracker::new(1);
        assert!(tracker.record_error(ErrorKey::for_retrieve_error(&status(500))));
        assert!(!tracker.record_error(ErrorKey::for_retrieve_error(&status(500))));
        assert!(tracker.record_error(ErrorKey::for_retrieve_error(&status(503))));
    }

    #[test]
    fn keys_follow_fetch_error_variant() {
        let not_found = RetrieveError::Fetch(FetchError::NotFound("mem://a".to_owned()));
        assert_eq!(ErrorKey::for_retrieve_error(&not_found), ErrorKey::NotFound);
        let cancelled = RetrieveError::Fetch(FetchError::Cancelled);
        assert_eq!(ErrorKey::for_retrieve_error(&cancelled), ErrorKey::Cancelled);
        let parse = RetrieveError::Parse(ParseError::MissingMember("jwks_uri"));
        assert_eq!(ErrorKey::for_retrieve_error(&parse), ErrorKey::Parse);
    }

    #[test]
    fn jitter_is_below_maximum() {
        for _ in 0..1_000 {
            assert!(refresh_jitter() < MAX_REFRESH_JITTER);
        }
    }
}
