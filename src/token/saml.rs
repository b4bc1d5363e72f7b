//! Minimal view of a SAML assertion.

use super::SecurityToken;
use time::OffsetDateTime;

/// The parts of a SAML assertion that matter when its signature did not verify.
///
/// XML handling is left to the caller: populate the assertion from whatever
/// SAML stack produced it.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SamlAssertion {
    id: String,
    issuer: Option<String>,
    key_id: Option<String>,
    not_before: Option<OffsetDateTime>,
    not_on_or_after: Option<OffsetDateTime>,
}

impl SamlAssertion {
    /// Creates an assertion with the given `ID` attribute.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the `<Issuer>` value.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Sets the key identifier from the signature's `<KeyInfo>`.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Sets the `<Conditions>` validity window.
    #[must_use]
    pub fn with_conditions(
        mut self,
        not_before: Option<OffsetDateTime>,
        not_on_or_after: Option<OffsetDateTime>,
    ) -> Self {
        self.not_before = not_before;
        self.not_on_or_after = not_on_or_after;
        self
    }

    /// Returns the assertion `ID`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the `<Issuer>` value.
    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// Returns the signing key identifier.
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Returns `Conditions/@NotBefore`.
    pub const fn not_before(&self) -> Option<OffsetDateTime> {
        self.not_before
    }

    /// Returns `Conditions/@NotOnOrAfter`.
    pub const fn not_on_or_after(&self) -> Option<OffsetDateTime> {
        self.not_on_or_after
    }
}

impl SecurityToken for SamlAssertion {
    fn key_id(&self) -> Option<&str> {
        self.key_id()
    }

    fn issuer(&self) -> Option<&str> {
        self.issuer()
    }

    fn not_before(&self) -> Option<OffsetDateTime> {
        self.not_before
    }

    fn expires(&self) -> Option<OffsetDateTime> {
        self.not_on_or_after
    }
}
