use super::errors::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use tokio_util::sync::CancellationToken;

#[cfg(feature = "http")]
use std::time::Duration;
#[cfg(feature = "http")]
use url::Url;

/// Fetches the raw text of a document from an address.
///
/// Implementations own their timeout policy. `cancel` only reflects the
/// caller's interest in the result.
#[async_trait]
pub trait DocumentRetriever: Debug + Send + Sync + 'static {
    /// Returns the document stored at `address`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on any transport failure.
    async fn get_document(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError>;
}

/// Default timeout applied by [`HttpDocumentRetriever::new`].
#[cfg(feature = "http")]
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(100);

/// Retrieves documents over HTTP(S) with `reqwest`.
///
/// Plain `http` addresses are rejected unless [`require_https`](Self::require_https)
/// is turned off.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpDocumentRetriever {
    client: reqwest::Client,
    require_https: bool,
}

#[cfg(feature = "http")]
impl HttpDocumentRetriever {
    /// Creates a retriever with its own client and [`DEFAULT_HTTP_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self::with_client(client))
    }

    /// Creates a retriever that uses an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            require_https: true,
        }
    }

    /// Sets whether non-`https` addresses are rejected (default `true`).
    #[must_use]
    pub fn require_https(mut self, require_https: bool) -> Self {
        self.require_https = require_https;
        self
    }

    async fn fetch(&self, url: Url, address: &str) -> Result<String, FetchError> {
        let http_error = |source| FetchError::Http {
            address: address.to_owned(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                address: address.to_owned(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(http_error)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl DocumentRetriever for HttpDocumentRetriever {
    async fn get_document(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        let url = Url::parse(address).map_err(|source| FetchError::InvalidAddress {
            address: address.to_owned(),
            source,
        })?;
        if self.require_https && url.scheme() != "https" {
            return Err(FetchError::HttpsRequired(address.to_owned()));
        }

        tokio::select! {
            () = cancel.cancelled() => Err(FetchError::Cancelled),
            result = self.fetch(url, address) => result,
        }
    }
}

/// Reads documents from the local file system.
///
/// Accepts plain paths and `file://` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDocumentRetriever;

#[async_trait]
impl DocumentRetriever for FileDocumentRetriever {
    async fn get_document(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        let path = address.strip_prefix("file://").unwrap_or(address);

        tokio::select! {
            () = cancel.cancelled() => Err(FetchError::Cancelled),
            result = tokio::fs::read_to_string(path) => result.map_err(|source| FetchError::Io {
                address: address.to_owned(),
                source,
            }),
        }
    }
}

/// Serves documents from memory.
///
/// Useful for tests and for configuration shipped with the application.
/// Documents can be replaced at any time to simulate key rotation.
#[derive(Debug, Default)]
pub struct InMemoryDocumentRetriever {
    documents: RwLock<HashMap<String, String>>,
    requests: AtomicUsize,
}

impl InMemoryDocumentRetriever {
    /// Creates an empty retriever.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document and returns the retriever.
    #[must_use]
    pub fn with_document(self, address: impl Into<String>, document: impl Into<String>) -> Self {
        self.insert(address, document);
        self
    }

    /// Adds or replaces the document served at `address`.
    pub fn insert(&self, address: impl Into<String>, document: impl Into<String>) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.into(), document.into());
    }

    /// Removes the document served at `address`.
    pub fn remove(&self, address: &str) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(address);
    }

    /// Returns how many times [`get_document`](DocumentRetriever::get_document) was called.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Acquire)
    }
}

#[async_trait]
impl DocumentRetriever for InMemoryDocumentRetriever {
    async fn get_document(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        self.requests.fetch_add(1, Ordering::AcqRel);
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(address.to_owned()))
    }
}
