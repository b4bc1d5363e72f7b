//! Signature-failure classification.
//!
//! When no candidate key verifies a token's signature, the cause is not
//! necessarily a missing key: an expired token or one from an untrusted issuer
//! would have been rejected anyway, and callers should hear about that first.
//! [`classify_jwt_signature_failure`] and [`classify_saml_signature_failure`]
//! re-run the lifetime and issuer checks and return the most fundamental error.

mod classifier;
mod errors;
mod issuer;
mod key_failures;
mod lifetime;
mod parameters;

pub use classifier::{classify_jwt_signature_failure, classify_saml_signature_failure};
pub use errors::{
    FailedToken, IssuerError, LifetimeError, SignatureKeyNotFoundError, ValidationError,
};
pub use issuer::validate_issuer;
pub use key_failures::{KeyFailure, KeyFailureLog};
pub use lifetime::validate_lifetime;
pub use parameters::ValidationParameters;
