use crate::configuration::JsonWebKeyError;
use thiserror::Error;

/// Transport-level failure while fetching a document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The address is not a valid URL.
    #[cfg(feature = "http")]
    #[error("invalid document address '{address}'")]
    InvalidAddress {
        /// The rejected address.
        address: String,
        /// The URL parser error.
        #[source]
        source: url::ParseError,
    },

    /// The retriever only accepts `https` addresses.
    #[error("document address must use https: '{0}'")]
    HttpsRequired(String),

    /// The server answered with a non-success status code.
    #[error("unexpected http status {status} from '{address}'")]
    Status {
        /// The requested address.
        address: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The HTTP request failed.
    #[cfg(feature = "http")]
    #[error("http request to '{address}' failed")]
    Http {
        /// The requested address.
        address: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be built.
    #[cfg(feature = "http")]
    #[error("cannot build http client")]
    Client(#[source] reqwest::Error),

    /// Reading a local document failed.
    #[error("cannot read document '{address}'")]
    Io {
        /// The requested address.
        address: String,
        /// The IO error.
        #[source]
        source: std::io::Error,
    },

    /// No document is registered for the address.
    #[error("no document found at '{0}'")]
    NotFound(String),

    /// The request was cancelled by the caller.
    #[error("document retrieval cancelled")]
    Cancelled,
}

/// The document was fetched but is not a valid configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The document is not valid JSON or does not match the expected shape.
    #[error("malformed json document")]
    Json(#[from] serde_json::Error),

    /// A required member is missing.
    #[error("document is missing required member '{0}'")]
    MissingMember(&'static str),

    /// A key in the document is invalid.
    #[error("invalid json web key")]
    Key(#[from] JsonWebKeyError),
}

/// Errors returned by a [`ConfigurationRetriever`](super::ConfigurationRetriever).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RetrieveError {
    /// The document could not be fetched.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The document could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

impl From<serde_json::Error> for RetrieveError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(ParseError::Json(e))
    }
}

impl From<JsonWebKeyError> for RetrieveError {
    fn from(e: JsonWebKeyError) -> Self {
        Self::Parse(ParseError::Key(e))
    }
}
