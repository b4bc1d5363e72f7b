use crate::retriever::{FetchError, RetrieveError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`ConfigurationManager`](super::ConfigurationManager).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigurationManagerError {
    /// No configuration has ever been retrieved, and the last attempt failed.
    ///
    /// This is only returned while the cache is empty. Once a configuration
    /// has been retrieved, refresh failures are logged and the stale
    /// configuration keeps being served.
    #[error("unable to obtain configuration from '{address}'")]
    NoConfigurationAvailable {
        /// The metadata address the manager was built for.
        address: String,
        /// The most recent retrieval failure.
        #[source]
        source: Option<Arc<RetrieveError>>,
    },

    /// The caller's cancellation token fired while waiting for an in-flight refresh.
    #[error("cancelled while waiting for configuration refresh")]
    Cancelled,

    /// The refresh task panicked or was aborted by the runtime.
    #[error("configuration refresh task failed")]
    RefreshTask(#[from] tokio::task::JoinError),

    /// A refresh interval is below its allowed minimum.
    #[error("{kind} must be at least {minimum:?} (got {value:?})")]
    InvalidRefreshInterval {
        /// Which interval was rejected.
        kind: IntervalKind,
        /// The rejected value.
        value: Duration,
        /// The floor for this interval.
        minimum: Duration,
    },

    /// The default document retriever could not be created.
    #[error("cannot create document retriever: {0}")]
    DocumentRetriever(#[source] FetchError),
}

/// Names the interval rejected by [`ConfigurationManagerError::InvalidRefreshInterval`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IntervalKind {
    /// The automatic refresh interval.
    AutomaticRefresh,
    /// The explicit refresh interval.
    Refresh,
}

impl IntervalKind {
    /// Returns a stable string representation of the interval kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AutomaticRefresh => "automatic_refresh_interval",
            Self::Refresh => "refresh_interval",
        }
    }
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error kinds for structured metrics reporting.
///
/// Stable, low-cardinality labels.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum MetricsErrorKind {
    /// A document could not be fetched.
    Fetch,
    /// A fetched document could not be parsed.
    Parse,
    /// A retrieved configuration failed validation (it is still used).
    ValidationFailed,
    /// A caller was refused because no configuration has ever been retrieved.
    NoConfigurationAvailable,
    /// The refresh task panicked or was aborted.
    RefreshTaskFailed,
}

impl MetricsErrorKind {
    /// Returns a string representation of the error kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Parse => "parse",
            Self::ValidationFailed => "validation_failed",
            Self::NoConfigurationAvailable => "no_configuration_available",
            Self::RefreshTaskFailed => "refresh_task_failed",
        }
    }

    pub(super) fn for_retrieve_error(error: &RetrieveError) -> Self {
        match error {
            RetrieveError::Fetch(_) => Self::Fetch,
            _ => Self::Parse,
        }
    }
}

impl fmt::Display for MetricsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
