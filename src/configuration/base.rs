use super::jwk::{JsonWebKey, JsonWebKeySet};
use std::sync::Arc;

/// Normalized view over a configuration: the fields token validation needs
/// without knowing the concrete document shape.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct BaseConfiguration {
    issuer: Option<String>,
    signing_keys: Vec<Arc<JsonWebKey>>,
    token_endpoint: Option<String>,
}

impl BaseConfiguration {
    /// Creates an empty base configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Sets the signing keys.
    #[must_use]
    pub fn with_signing_keys(mut self, keys: impl IntoIterator<Item = Arc<JsonWebKey>>) -> Self {
        self.signing_keys = keys.into_iter().collect();
        self
    }

    /// Sets the token endpoint.
    #[must_use]
    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = Some(endpoint.into());
        self
    }

    /// Returns the issuer advertised by the configuration.
    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// Returns the keys a token signature may be verified with.
    pub fn signing_keys(&self) -> &[Arc<JsonWebKey>] {
        &self.signing_keys
    }

    /// Returns the token endpoint.
    pub fn token_endpoint(&self) -> Option<&str> {
        self.token_endpoint.as_deref()
    }
}

/// Narrows a concrete configuration type to a [`BaseConfiguration`].
///
/// Implementations return `None` when the configuration carries nothing a
/// token validator could use.
pub trait AsBaseConfiguration {
    /// Returns the normalized view, if this configuration has one.
    fn as_base_configuration(&self) -> Option<BaseConfiguration>;
}

impl AsBaseConfiguration for BaseConfiguration {
    fn as_base_configuration(&self) -> Option<BaseConfiguration> {
        Some(self.clone())
    }
}

impl AsBaseConfiguration for JsonWebKeySet {
    fn as_base_configuration(&self) -> Option<BaseConfiguration> {
        Some(BaseConfiguration::new().with_signing_keys(self.signing_keys().cloned()))
    }
}

impl AsBaseConfiguration for String {
    fn as_base_configuration(&self) -> Option<BaseConfiguration> {
        None
    }
}
