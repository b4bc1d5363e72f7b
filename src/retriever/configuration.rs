use super::document::DocumentRetriever;
use super::errors::{ParseError, RetrieveError};
use crate::configuration::{JsonWebKeySet, OpenIdConnectConfiguration};
use crate::prelude::debug;
use async_trait::async_trait;
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

/// Turns the document(s) found at an address into a typed configuration.
#[async_trait]
pub trait ConfigurationRetriever<T>: Debug + Send + Sync + 'static {
    /// Fetches the document at `address` with `retriever` and parses it.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError::Fetch`] when a document cannot be fetched and
    /// [`RetrieveError::Parse`] when it is malformed.
    async fn get_configuration(
        &self,
        address: &str,
        retriever: &dyn DocumentRetriever,
        cancel: &CancellationToken,
    ) -> Result<T, RetrieveError>;
}

/// Retrieves an OpenID Connect discovery document and the key set at its `jwks_uri`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenIdConnectConfigurationRetriever;

#[async_trait]
impl ConfigurationRetriever<OpenIdConnectConfiguration> for OpenIdConnectConfigurationRetriever {
    async fn get_configuration(
        &self,
        address: &str,
        retriever: &dyn DocumentRetriever,
        cancel: &CancellationToken,
    ) -> Result<OpenIdConnectConfiguration, RetrieveError> {
        let document = retriever.get_document(address, cancel).await?;
        let mut configuration = OpenIdConnectConfiguration::from_json(&document)?;

        let jwks_uri = configuration
            .jwks_uri()
            .filter(|uri| !uri.is_empty())
            .map(str::to_owned);

        if let Some(jwks_uri) = jwks_uri {
            let keys = retriever.get_document(&jwks_uri, cancel).await?;
            let key_set = JsonWebKeySet::from_json(keys.as_bytes())?;
            debug!(
                "Fetched signing keys: address={}, jwks_uri={}, keys={}",
                address,
                jwks_uri,
                key_set.len()
            );
            configuration.set_json_web_key_set(key_set);
        }

        Ok(configuration)
    }
}

/// Retrieves a bare JWKS document.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonWebKeySetRetriever;

#[async_trait]
impl ConfigurationRetriever<JsonWebKeySet> for JsonWebKeySetRetriever {
    async fn get_configuration(
        &self,
        address: &str,
        retriever: &dyn DocumentRetriever,
        cancel: &CancellationToken,
    ) -> Result<JsonWebKeySet, RetrieveError> {
        let document = retriever.get_document(address, cancel).await?;
        Ok(JsonWebKeySet::from_json(document.as_bytes())?)
    }
}

/// Retrieves the raw document text without interpreting it.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawDocumentRetriever;

#[async_trait]
impl ConfigurationRetriever<String> for RawDocumentRetriever {
    async fn get_configuration(
        &self,
        address: &str,
        retriever: &dyn DocumentRetriever,
        cancel: &CancellationToken,
    ) -> Result<String, RetrieveError> {
        let document = retriever.get_document(address, cancel).await?;
        if document.trim().is_empty() {
            return Err(ParseError::MissingMember("document body").into());
        }
        Ok(document)
    }
}
