use super::base::{AsBaseConfiguration, BaseConfiguration};
use super::jwk::{JsonWebKey, JsonWebKeySet};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An OpenID Connect discovery document (`/.well-known/openid-configuration`)
/// together with the key set published at its `jwks_uri`.
///
/// Members the type does not model are kept in [`additional_data`](Self::additional_data).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OpenIdConnectConfiguration {
    #[serde(default)]
    issuer: Option<String>,
    #[serde(default)]
    jwks_uri: Option<String>,
    #[serde(default)]
    authorization_endpoint: Option<String>,
    #[serde(default)]
    token_endpoint: Option<String>,
    #[serde(default)]
    userinfo_endpoint: Option<String>,
    #[serde(default)]
    end_session_endpoint: Option<String>,
    #[serde(default)]
    id_token_signing_alg_values_supported: Vec<String>,
    #[serde(default)]
    response_types_supported: Vec<String>,
    #[serde(default)]
    scopes_supported: Vec<String>,
    #[serde(default)]
    subject_types_supported: Vec<String>,
    #[serde(default)]
    claims_supported: Vec<String>,
    #[serde(flatten)]
    additional_data: BTreeMap<String, Value>,
    #[serde(skip)]
    json_web_key_set: Option<JsonWebKeySet>,
}

impl OpenIdConnectConfiguration {
    /// Parses a discovery document. The key set is not fetched.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the document is not a JSON object or a
    /// modelled member has the wrong type.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns the `issuer` member.
    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// Returns the `jwks_uri` member.
    pub fn jwks_uri(&self) -> Option<&str> {
        self.jwks_uri.as_deref()
    }

    /// Returns the `authorization_endpoint` member.
    pub fn authorization_endpoint(&self) -> Option<&str> {
        self.authorization_endpoint.as_deref()
    }

    /// Returns the `token_endpoint` member.
    pub fn token_endpoint(&self) -> Option<&str> {
        self.token_endpoint.as_deref()
    }

    /// Returns the `userinfo_endpoint` member.
    pub fn userinfo_endpoint(&self) -> Option<&str> {
        self.userinfo_endpoint.as_deref()
    }

    /// Returns the `end_session_endpoint` member.
    pub fn end_session_endpoint(&self) -> Option<&str> {
        self.end_session_endpoint.as_deref()
    }

    /// Returns the `id_token_signing_alg_values_supported` member.
    pub fn id_token_signing_alg_values_supported(&self) -> &[String] {
        &self.id_token_signing_alg_values_supported
    }

    /// Returns the `response_types_supported` member.
    pub fn response_types_supported(&self) -> &[String] {
        &self.response_types_supported
    }

    /// Returns the `scopes_supported` member.
    pub fn scopes_supported(&self) -> &[String] {
        &self.scopes_supported
    }

    /// Returns the `subject_types_supported` member.
    pub fn subject_types_supported(&self) -> &[String] {
        &self.subject_types_supported
    }

    /// Returns the `claims_supported` member.
    pub fn claims_supported(&self) -> &[String] {
        &self.claims_supported
    }

    /// Returns members of the document that have no dedicated accessor.
    pub fn additional_data(&self) -> &BTreeMap<String, Value> {
        &self.additional_data
    }

    /// Returns the key set fetched from `jwks_uri`, if any.
    pub fn json_web_key_set(&self) -> Option<&JsonWebKeySet> {
        self.json_web_key_set.as_ref()
    }

    /// Attaches the key set fetched from `jwks_uri`.
    pub fn set_json_web_key_set(&mut self, key_set: JsonWebKeySet) {
        self.json_web_key_set = Some(key_set);
    }

    /// Returns the keys usable for signature verification.
    pub fn signing_keys(&self) -> impl Iterator<Item = &Arc<JsonWebKey>> {
        self.json_web_key_set
            .iter()
            .flat_map(JsonWebKeySet::signing_keys)
    }
}

impl AsBaseConfiguration for OpenIdConnectConfiguration {
    fn as_base_configuration(&self) -> Option<BaseConfiguration> {
        let mut base = BaseConfiguration::new().with_signing_keys(self.signing_keys().cloned());
        if let Some(issuer) = self.issuer() {
            base = base.with_issuer(issuer);
        }
        if let Some(endpoint) = self.token_endpoint() {
            base = base.with_token_endpoint(endpoint);
        }
        Some(base)
    }
}
