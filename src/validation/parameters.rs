use crate::clock::{Clock, SystemClock};
use crate::configuration::JsonWebKey;
use crate::constants::DEFAULT_CLOCK_SKEW;
use std::sync::Arc;
use std::time::Duration;

/// Static trust settings consulted when a token fails signature verification.
///
/// The defaults validate both lifetime and issuer, require an expiration time,
/// and allow five minutes of clock skew.
#[derive(Debug, Clone)]
pub struct ValidationParameters {
    valid_issuers: Vec<String>,
    issuer_signing_keys: Vec<Arc<JsonWebKey>>,
    clock_skew: Duration,
    validate_lifetime: bool,
    validate_issuer: bool,
    require_expiration_time: bool,
    clock: Arc<dyn Clock>,
}

impl Default for ValidationParameters {
    fn default() -> Self {
        Self {
            valid_issuers: Vec::new(),
            issuer_signing_keys: Vec::new(),
            clock_skew: DEFAULT_CLOCK_SKEW,
            validate_lifetime: true,
            validate_issuer: true,
            require_expiration_time: true,
            clock: Arc::new(SystemClock),
        }
    }
}

impl ValidationParameters {
    /// Returns the default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the issuers accepted in addition to the configuration's issuer.
    #[must_use]
    pub fn with_valid_issuers<I, S>(mut self, issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_issuers = issuers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the keys supplied directly, outside any configuration.
    #[must_use]
    pub fn with_issuer_signing_keys(
        mut self,
        keys: impl IntoIterator<Item = Arc<JsonWebKey>>,
    ) -> Self {
        self.issuer_signing_keys = keys.into_iter().collect();
        self
    }

    /// Sets the tolerance applied to lifetime checks.
    #[must_use]
    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    /// Enables or disables the lifetime check.
    #[must_use]
    pub fn with_validate_lifetime(mut self, validate: bool) -> Self {
        self.validate_lifetime = validate;
        self
    }

    /// Enables or disables the issuer check.
    #[must_use]
    pub fn with_validate_issuer(mut self, validate: bool) -> Self {
        self.validate_issuer = validate;
        self
    }

    /// Sets whether tokens without an expiration time are rejected.
    #[must_use]
    pub fn with_require_expiration_time(mut self, require: bool) -> Self {
        self.require_expiration_time = require;
        self
    }

    /// Sets the clock (defaults to [`SystemClock`]).
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the statically trusted issuers.
    pub fn valid_issuers(&self) -> &[String] {
        &self.valid_issuers
    }

    /// Returns the statically supplied signing keys.
    pub fn issuer_signing_keys(&self) -> &[Arc<JsonWebKey>] {
        &self.issuer_signing_keys
    }

    /// Returns the lifetime tolerance.
    pub const fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    /// Returns `true` if the lifetime check runs.
    pub const fn validate_lifetime(&self) -> bool {
        self.validate_lifetime
    }

    /// Returns `true` if the issuer check runs.
    pub const fn validate_issuer(&self) -> bool {
        self.validate_issuer
    }

    /// Returns `true` if an expiration time is required.
    pub const fn require_expiration_time(&self) -> bool {
        self.require_expiration_time
    }

    /// Returns the clock.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}
