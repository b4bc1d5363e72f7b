use super::key_failures::KeyFailureLog;
use crate::token::{JwtToken, SamlAssertion};
use std::fmt;
use thiserror::Error;
use time::OffsetDateTime;

/// The token's validity window does not contain the current time.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum LifetimeError {
    /// The token has no expiration time and one is required.
    #[error("token has no expiration time")]
    NoExpiration,

    /// `not_before` is after `expires`.
    #[error("token lifetime is invalid: not_before ({not_before}) is after expires ({expires})")]
    InvalidLifetime {
        /// Start of the validity window.
        not_before: OffsetDateTime,
        /// End of the validity window.
        expires: OffsetDateTime,
    },

    /// The validity window has not started yet, even allowing for clock skew.
    #[error("token is not yet valid (not_before={not_before}, now={now})")]
    NotYetValid {
        /// Start of the validity window.
        not_before: OffsetDateTime,
        /// Time of the check.
        now: OffsetDateTime,
    },

    /// The validity window is over, even allowing for clock skew.
    #[error("token has expired (expires={expires}, now={now})")]
    Expired {
        /// End of the validity window.
        expires: OffsetDateTime,
        /// Time of the check.
        now: OffsetDateTime,
    },
}

/// The token was not issued by a trusted issuer.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum IssuerError {
    /// The token has no issuer, or an empty one.
    #[error("token has no issuer")]
    MissingIssuer,

    /// Neither the validation parameters nor the configuration name any issuer.
    #[error("no valid issuers are configured (issuer={0})")]
    NoValidIssuers(String),

    /// The issuer is not one of the trusted issuers.
    #[error("issuer '{issuer}' is not trusted (valid_issuers={valid_issuers:?})")]
    InvalidIssuer {
        /// The issuer found in the token.
        issuer: String,
        /// Every issuer that would have been accepted.
        valid_issuers: Vec<String>,
    },
}

/// The token whose signature could not be verified.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FailedToken {
    /// A compact JWT.
    Jwt(JwtToken),
    /// A SAML assertion.
    Saml(SamlAssertion),
}

/// No candidate key verified the signature of an otherwise valid token.
///
/// `Display` never includes the token itself; use [`token`](Self::token) to
/// inspect it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SignatureKeyNotFoundError {
    pub(super) key_id: Option<String>,
    pub(super) validation_key_count: usize,
    pub(super) configuration_key_count: Option<usize>,
    pub(super) key_descriptor: Option<String>,
    pub(super) key_failures: KeyFailureLog,
    pub(super) token: FailedToken,
}

impl SignatureKeyNotFoundError {
    /// Returns the key identifier the token referenced.
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Returns the number of keys supplied through the validation parameters.
    pub const fn validation_key_count(&self) -> usize {
        self.validation_key_count
    }

    /// Returns the number of keys supplied by the configuration (JWT only).
    pub const fn configuration_key_count(&self) -> Option<usize> {
        self.configuration_key_count
    }

    /// Returns the key descriptor of the signature (SAML only).
    pub fn key_descriptor(&self) -> Option<&str> {
        self.key_descriptor.as_deref()
    }

    /// Returns the failures recorded for each key that was tried.
    pub const fn key_failures(&self) -> &KeyFailureLog {
        &self.key_failures
    }

    /// Returns the token.
    pub const fn token(&self) -> &FailedToken {
        &self.token
    }
}

impl fmt::Display for SignatureKeyNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "signature validation failed: no key matched kid '{}' (validation_parameter_keys={}",
            self.key_id.as_deref().unwrap_or("<none>"),
            self.validation_key_count
        )?;
        if let Some(count) = self.configuration_key_count {
            write!(f, ", configuration_keys={count}")?;
        }
        if let Some(descriptor) = &self.key_descriptor {
            write!(f, ", key_info='{descriptor}'")?;
        }
        write!(f, "); {}", self.key_failures)
    }
}

impl std::error::Error for SignatureKeyNotFoundError {}

/// Final error produced when a token signature could not be verified.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    /// The token lifetime is invalid. Reported ahead of any issuer problem.
    #[error(transparent)]
    Lifetime(#[from] LifetimeError),

    /// The token issuer is not trusted.
    #[error(transparent)]
    Issuer(#[from] IssuerError),

    /// The token is otherwise valid but no key verified its signature.
    #[error(transparent)]
    SignatureKeyNotFound(#[from] SignatureKeyNotFoundError),
}
