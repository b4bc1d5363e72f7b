//! Security tokens as seen by the signature-failure classifier.
//!
//! [`JwtToken`] decodes a compact JWT without verifying it; [`SamlAssertion`]
//! carries the few members of a SAML assertion the classifier reads. Both
//! implement [`SecurityToken`].

mod jwt;
mod saml;

pub use jwt::{Claims, JwtToken};
pub use saml::SamlAssertion;

use thiserror::Error;
use time::OffsetDateTime;

/// Members common to every token kind.
pub trait SecurityToken {
    /// Identifier of the key the token claims to be signed with.
    fn key_id(&self) -> Option<&str>;

    /// The token issuer.
    fn issuer(&self) -> Option<&str>;

    /// Start of the validity window.
    fn not_before(&self) -> Option<OffsetDateTime>;

    /// End of the validity window.
    fn expires(&self) -> Option<OffsetDateTime>;
}

/// Errors that can arise parsing a [`JwtToken`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TokenError {
    /// Token does not have 3 dot-separated parts.
    #[error("malformed jwt token: expected 3 dot-separated parts")]
    InvalidJwtFormat,

    /// Invalid base64url encoding in JWT header/claims.
    #[error("malformed jwt token: invalid base64url encoding")]
    InvalidBase64,

    /// Invalid JSON in JWT header or claims.
    #[error("malformed jwt token: invalid json")]
    InvalidJson(#[source] serde_json::Error),

    /// The header 'typ' contains a value other than 'JWT' or 'JOSE'.
    #[error("token header 'typ' should be 'JWT' or 'JOSE' (got '{0}')")]
    InvalidTyp(String),

    /// The 'alg' header is not a known signing algorithm.
    #[error("algorithm in 'alg' header is not supported: {0}")]
    UnsupportedAlgorithm(String),

    /// An 'nbf' or 'exp' claim is outside the representable time range.
    #[error("invalid token timestamp claim: {0}")]
    InvalidTimestamp(i64),
}
