//! Configuration manager: cached, periodically refreshed remote configuration.
//!
//! This module provides the [`ConfigurationManager`] type and its configuration
//! types. A manager owns one cached configuration value of any type `T` and
//! fetches it from a metadata address through a
//! [`ConfigurationRetriever`](crate::retriever::ConfigurationRetriever).
//!
//! Refreshes are single-flight: concurrent callers that find the cache due
//! share one fetch. Once a configuration has been retrieved, refresh failures
//! never surface to callers; the stale value keeps being served while the next
//! attempt is scheduled. Use [`ConfigurationManager::request_refresh`] when a
//! token references a key the cached configuration does not know.
//!
//! Primary types are re-exported at the crate root. For advanced configuration
//! types (e.g., `MetricsErrorKind`, `MetricsRecorder`, `SigningKeyCountValidator`),
//! import from this module.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use token_trust::config_manager::SigningKeyCountValidator;
//! use token_trust::retriever::{InMemoryDocumentRetriever, JsonWebKeySetRetriever};
//! use token_trust::ConfigurationManager;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let documents = Arc::new(InMemoryDocumentRetriever::new().with_document(
//!     "mem://jwks",
//!     r#"{"keys":[{"kty":"oct","kid":"k1","k":"c2VjcmV0"}]}"#,
//! ));
//!
//! let manager = ConfigurationManager::builder("mem://jwks", JsonWebKeySetRetriever)
//!     .document_retriever(documents)
//!     .validator(SigningKeyCountValidator::default())
//!     .build()?;
//!
//! let key_set = manager.get_configuration(&CancellationToken::new()).await?;
//! assert!(key_set.find("k1").is_some());
//! # Ok(())
//! # }
//! ```

mod builder;
mod errors;
mod manager;
mod metrics;
mod refresh;
mod validator;

pub use builder::{ConfigurationManagerBuilder, RefreshPolicy};
pub use errors::{ConfigurationManagerError, IntervalKind, MetricsErrorKind};
pub use manager::ConfigurationManager;
pub use metrics::MetricsRecorder;
pub use validator::{
    ConfigurationValidationResult, ConfigurationValidator, SigningKeyCountValidator,
    DEFAULT_MINIMUM_SIGNING_KEYS,
};
