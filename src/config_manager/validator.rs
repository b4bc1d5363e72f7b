use crate::configuration::AsBaseConfiguration;

/// Outcome of a [`ConfigurationValidator`] run.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ConfigurationValidationResult {
    succeeded: bool,
    error_message: Option<String>,
}

impl ConfigurationValidationResult {
    /// A passing result.
    pub fn success() -> Self {
        Self {
            succeeded: true,
            error_message: None,
        }
    }

    /// A failing result with a human-readable reason.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            error_message: Some(message.into()),
        }
    }

    /// Returns `true` if validation passed.
    pub const fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Returns the failure reason.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Semantic check run on every freshly retrieved configuration.
///
/// Validators report; they never fail the refresh. A configuration that does
/// not pass is still cached, and the result is logged.
pub trait ConfigurationValidator<T>: Send + Sync + 'static {
    /// Validates `configuration`.
    fn validate(&self, configuration: &T) -> ConfigurationValidationResult;
}

impl<T, F> ConfigurationValidator<T> for F
where
    F: Fn(&T) -> ConfigurationValidationResult + Send + Sync + 'static,
{
    fn validate(&self, configuration: &T) -> ConfigurationValidationResult {
        self(configuration)
    }
}

/// Default minimum number of signing keys required by [`SigningKeyCountValidator`].
pub const DEFAULT_MINIMUM_SIGNING_KEYS: usize = 1;

/// Checks that a configuration publishes enough signing keys.
///
/// A configuration that cannot be viewed as a
/// [`BaseConfiguration`](crate::configuration::BaseConfiguration) fails.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SigningKeyCountValidator {
    minimum: usize,
}

impl Default for SigningKeyCountValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MINIMUM_SIGNING_KEYS)
    }
}

impl SigningKeyCountValidator {
    /// Requires at least `minimum` signing keys.
    pub const fn new(minimum: usize) -> Self {
        Self { minimum }
    }

    /// Returns the required number of signing keys.
    pub const fn minimum(&self) -> usize {
        self.minimum
    }
}

impl<T: AsBaseConfiguration> ConfigurationValidator<T> for SigningKeyCountValidator {
    fn validate(&self, configuration: &T) -> ConfigurationValidationResult {
        let Some(base) = configuration.as_base_configuration() else {
            return ConfigurationValidationResult::failure(
                "configuration does not expose signing keys",
            );
        };

        let actual = base.signing_keys().len();
        if actual < self.minimum {
            return ConfigurationValidationResult::failure(format!(
                "configuration has {actual} signing keys (minimum={})",
                self.minimum
            ));
        }
        ConfigurationValidationResult::success()
    }
}
