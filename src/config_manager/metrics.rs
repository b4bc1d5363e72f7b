use super::errors::MetricsErrorKind;

/// Receives counters from a [`ConfigurationManager`](super::ConfigurationManager).
///
/// Implementations must be cheap and must not block: they are called while the
/// refresh lock is held.
pub trait MetricsRecorder: Send + Sync + 'static {
    /// A refresh retrieved a new configuration.
    fn record_refresh(&self);

    /// An explicit refresh request was honored.
    fn record_refresh_request(&self) {}

    /// An error of the given kind occurred.
    fn record_error(&self, kind: MetricsErrorKind);
}
