use super::errors::{ConfigurationManagerError, IntervalKind};
use super::manager::ConfigurationManager;
use super::metrics::MetricsRecorder;
use super::validator::ConfigurationValidator;
use crate::clock::{Clock, SystemClock};
use crate::constants::{
    DEFAULT_AUTOMATIC_REFRESH_INTERVAL, DEFAULT_REFRESH_INTERVAL, INFINITE_REFRESH_INTERVAL,
    MINIMUM_AUTOMATIC_REFRESH_INTERVAL, MINIMUM_REFRESH_INTERVAL,
};
use crate::retriever::{ConfigurationRetriever, DocumentRetriever};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How often a [`ConfigurationManager`] goes back to the metadata address.
///
/// Both intervals are checked against their floors when set, so a policy value
/// is always valid.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RefreshPolicy {
    automatic_refresh_interval: Duration,
    refresh_interval: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            automatic_refresh_interval: DEFAULT_AUTOMATIC_REFRESH_INTERVAL,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl RefreshPolicy {
    /// Returns the default policy: refresh every 12 hours, honor explicit
    /// refresh requests at most every 5 minutes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the automatic refresh interval.
    ///
    /// Use [`INFINITE_REFRESH_INTERVAL`] to never refresh on a timer; this also
    /// disables [`ConfigurationManager::request_refresh`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationManagerError::InvalidRefreshInterval`] if `interval`
    /// is shorter than [`MINIMUM_AUTOMATIC_REFRESH_INTERVAL`].
    pub fn with_automatic_refresh_interval(
        mut self,
        interval: Duration,
    ) -> Result<Self, ConfigurationManagerError> {
        check_floor(
            IntervalKind::AutomaticRefresh,
            interval,
            MINIMUM_AUTOMATIC_REFRESH_INTERVAL,
        )?;
        self.automatic_refresh_interval = interval;
        Ok(self)
    }

    /// Sets the minimum gap between two honored explicit refresh requests.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationManagerError::InvalidRefreshInterval`] if `interval`
    /// is shorter than [`MINIMUM_REFRESH_INTERVAL`].
    pub fn with_refresh_interval(
        mut self,
        interval: Duration,
    ) -> Result<Self, ConfigurationManagerError> {
        check_floor(IntervalKind::Refresh, interval, MINIMUM_REFRESH_INTERVAL)?;
        self.refresh_interval = interval;
        Ok(self)
    }

    /// Returns the automatic refresh interval.
    pub const fn automatic_refresh_interval(&self) -> Duration {
        self.automatic_refresh_interval
    }

    /// Returns the explicit refresh interval.
    pub const fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Returns `true` if automatic refresh is disabled.
    pub fn is_infinite(&self) -> bool {
        self.automatic_refresh_interval == INFINITE_REFRESH_INTERVAL
    }

    /// Delay before retrying after a failed refresh.
    pub(super) fn failure_backoff(&self) -> Duration {
        self.automatic_refresh_interval.min(self.refresh_interval)
    }
}

fn check_floor(
    kind: IntervalKind,
    value: Duration,
    minimum: Duration,
) -> Result<(), ConfigurationManagerError> {
    if value < minimum {
        return Err(ConfigurationManagerError::InvalidRefreshInterval {
            kind,
            value,
            minimum,
        });
    }
    Ok(())
}

/// Builder for [`ConfigurationManager`].
///
/// Only the metadata address and the configuration retriever are required.
/// Without an explicit document retriever, an
/// [`HttpDocumentRetriever`](crate::retriever::HttpDocumentRetriever) is used
/// (requires the `http` feature).
///
/// # Examples
///
/// ```no_run
/// use token_trust::retriever::OpenIdConnectConfigurationRetriever;
/// use token_trust::{ConfigurationManager, RefreshPolicy};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = ConfigurationManager::builder(
///     "https://login.example.com/.well-known/openid-configuration",
///     OpenIdConnectConfigurationRetriever,
/// )
/// .refresh_policy(RefreshPolicy::new().with_refresh_interval(Duration::from_secs(30))?)
/// .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigurationManagerBuilder<T> {
    address: String,
    configuration_retriever: Arc<dyn ConfigurationRetriever<T>>,
    document_retriever: Option<Arc<dyn DocumentRetriever>>,
    validator: Option<Arc<dyn ConfigurationValidator<T>>>,
    policy: RefreshPolicy,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<dyn MetricsRecorder>>,
}

impl<T> fmt::Debug for ConfigurationManagerBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationManagerBuilder")
            .field("address", &self.address)
            .field("configuration_retriever", &self.configuration_retriever)
            .field("document_retriever", &self.document_retriever)
            .field("validator", &self.validator.as_ref().map(|_| "<ConfigurationValidator>"))
            .field("policy", &self.policy)
            .field("clock", &self.clock)
            .field("metrics", &self.metrics.as_ref().map(|_| "<MetricsRecorder>"))
            .finish()
    }
}

impl<T: Send + Sync + 'static> ConfigurationManagerBuilder<T> {
    pub(super) fn new(
        address: impl Into<String>,
        configuration_retriever: impl ConfigurationRetriever<T>,
    ) -> Self {
        Self {
            address: address.into(),
            configuration_retriever: Arc::new(configuration_retriever),
            document_retriever: None,
            validator: None,
            policy: RefreshPolicy::default(),
            clock: Arc::new(SystemClock),
            metrics: None,
        }
    }

    /// Sets the retriever used to fetch documents.
    #[must_use]
    pub fn document_retriever(mut self, retriever: Arc<dyn DocumentRetriever>) -> Self {
        self.document_retriever = Some(retriever);
        self
    }

    /// Sets a validator run on every retrieved configuration.
    ///
    /// A configuration that fails validation is logged and still cached.
    #[must_use]
    pub fn validator(mut self, validator: impl ConfigurationValidator<T>) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Sets the refresh policy.
    #[must_use]
    pub fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the clock (defaults to [`SystemClock`]).
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets a metrics recorder.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds the manager. No document is fetched until the first
    /// [`ConfigurationManager::get_configuration`] call.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationManagerError::DocumentRetriever`] if no document
    /// retriever was set and the default one cannot be created.
    pub fn build(self) -> Result<ConfigurationManager<T>, ConfigurationManagerError> {
        let document_retriever = match self.document_retriever {
            Some(retriever) => retriever,
            None => default_document_retriever()?,
        };

        Ok(ConfigurationManager::from_parts(
            self.address,
            document_retriever,
            self.configuration_retriever,
            self.validator,
            self.policy,
            self.clock,
            self.metrics,
        ))
    }
}

#[cfg(feature = "http")]
fn default_document_retriever() -> Result<Arc<dyn DocumentRetriever>, ConfigurationManagerError> {
    let retriever = crate::retriever::HttpDocumentRetriever::new()
        .map_err(ConfigurationManagerError::DocumentRetriever)?;
    Ok(Arc::new(retriever))
}

#[cfg(not(feature = "http"))]
fn default_document_retriever() -> Result<Arc<dyn DocumentRetriever>, ConfigurationManagerError> {
    Ok(Arc::new(crate::retriever::FileDocumentRetriever))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_values() {
        let policy = RefreshPolicy::default();
        assert_eq!(policy.automatic_refresh_interval(), Duration::from_secs(12 * 3600));
        assert_eq!(policy.refresh_interval(), Duration::from_secs(300));
        assert!(!policy.is_infinite());
    }

    #[test]
    fn automatic_interval_floor_is_enforced() {
        let err = RefreshPolicy::new()
            .with_automatic_refresh_interval(Duration::from_secs(299))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationManagerError::InvalidRefreshInterval {
                kind: IntervalKind::AutomaticRefresh,
                ..
            }
        ));

        let policy = RefreshPolicy::new()
            .with_automatic_refresh_interval(MINIMUM_AUTOMATIC_REFRESH_INTERVAL)
            .unwrap();
        assert_eq!(policy.automatic_refresh_interval(), MINIMUM_AUTOMATIC_REFRESH_INTERVAL);
    }

    #[test]
    fn refresh_interval_floor_is_enforced() {
        let err = RefreshPolicy::new()
            .with_refresh_interval(Duration::from_millis(999))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationManagerError::InvalidRefreshInterval {
                kind: IntervalKind::Refresh,
                ..
            }
        ));
        assert!(RefreshPolicy::new()
            .with_refresh_interval(MINIMUM_REFRESH_INTERVAL)
            .is_ok());
    }

    #[test]
    fn failure_backoff_is_shorter_interval() {
        let policy = RefreshPolicy::new()
            .with_automatic_refresh_interval(Duration::from_secs(600))
            .unwrap()
            .with_refresh_interval(Duration::from_secs(1200))
            .unwrap();
        assert_eq!(policy.failure_backoff(), Duration::from_secs(600));
        assert_eq!(RefreshPolicy::new().failure_backoff(), DEFAULT_REFRESH_INTERVAL);
    }

    #[test]
    fn infinite_interval_is_accepted() {
        let policy = RefreshPolicy::new()
            .with_automatic_refresh_interval(INFINITE_REFRESH_INTERVAL)
            .unwrap();
        assert!(policy.is_infinite());
        assert_eq!(policy.failure_backoff(), DEFAULT_REFRESH_INTERVAL);
    }
}
