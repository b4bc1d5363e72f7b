//! Collaborators that fetch and parse remote configuration.
//!
//! A [`DocumentRetriever`] moves bytes; a [`ConfigurationRetriever`] turns them
//! into a typed configuration, possibly following links to further documents
//! (an OpenID Connect discovery document points at its key set).

mod configuration;
mod document;
mod errors;

pub use configuration::{
    ConfigurationRetriever, JsonWebKeySetRetriever, OpenIdConnectConfigurationRetriever,
    RawDocumentRetriever,
};
#[cfg(feature = "http")]
pub use document::{HttpDocumentRetriever, DEFAULT_HTTP_TIMEOUT};
pub use document::{DocumentRetriever, FileDocumentRetriever, InMemoryDocumentRetriever};
pub use errors::{FetchError, ParseError, RetrieveError};
