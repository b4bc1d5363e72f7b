#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

//! This crate provides the trust-decision core of a token validator.
//!
//! It keeps a locally cached copy of remotely hosted configuration, such as an
//! OpenID Connect discovery document or a JSON Web Key Set, with bounded
//! staleness and single-flight refresh. When a token's signature cannot be
//! verified by any trusted key, it explains why: an expired token or an
//! untrusted issuer is reported ahead of a missing key.
//!
//! The primary entry point is [`ConfigurationManager`], which serves the cached
//! configuration and refreshes it in the background of callers that find it due.
//!
//! ## Cached configuration
//!
//! ```no_run
//! use token_trust::retriever::OpenIdConnectConfigurationRetriever;
//! use token_trust::ConfigurationManager;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigurationManager::builder(
//!     "https://login.example.com/.well-known/openid-configuration",
//!     OpenIdConnectConfigurationRetriever,
//! )
//! .build()?;
//!
//! let configuration = manager.get_configuration(&CancellationToken::new()).await?;
//! let keys = configuration.signing_keys();
//! # Ok(())
//! # }
//! ```
//!
//! ## Signature failures
//!
//! ```no_run
//! use token_trust::token::JwtToken;
//! use token_trust::validation::{KeyFailureLog, ValidationParameters};
//! use token_trust::classify_jwt_signature_failure;
//!
//! # fn example(raw: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let token = JwtToken::parse_insecure(raw)?;
//! let params = ValidationParameters::new().with_valid_issuers(["https://login.example.com"]);
//!
//! let mut failures = KeyFailureLog::new();
//! // ... try each candidate key, recording failures ...
//! failures.record(Some("key-1"), "InvalidSignature");
//!
//! let error = classify_jwt_signature_failure(&token, &params, None, failures);
//! eprintln!("token rejected: {error}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **`http`**: [`HttpDocumentRetriever`](retriever::HttpDocumentRetriever) via `reqwest` (default)
//! - **`logging`**: log events through the `log` crate (default)
//! - **`tracing`**: log events through `tracing` instead of `log`

pub mod clock;
pub mod config_manager;
pub mod configuration;
pub mod constants;
pub mod retriever;
pub mod token;
pub mod validation;

mod observability;
mod prelude;

// -----------------------
// Re-exports
// -----------------------

pub use crate::{
    clock::{Clock, SystemClock},
    config_manager::{
        ConfigurationManager, ConfigurationManagerBuilder, ConfigurationManagerError,
        RefreshPolicy,
    },
    configuration::{BaseConfiguration, JsonWebKeySet, OpenIdConnectConfiguration},
    validation::{
        classify_jwt_signature_failure, classify_saml_signature_failure, ValidationError,
    },
};
