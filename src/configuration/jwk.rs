//! JSON Web Key and JSON Web Key Set types.

use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::DecodingKey;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// A single public key as published in a JWKS document.
///
/// The JSON object is kept verbatim so that callers can hand it to any JOSE
/// backend. Only the fields needed for key selection are extracted.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct JsonWebKey {
    kid: Option<Arc<str>>,
    kty: Arc<str>,
    key_use: Option<Arc<str>>,
    alg: Option<Arc<str>>,
    jwk_json: Arc<[u8]>,
}

/// Errors raised while reading a JWK or a JWKS document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JsonWebKeyError {
    /// The JWK is not a JSON object.
    #[error("jwk must be a json object")]
    NotAnObject,

    /// The JWK has no `kty` member.
    #[error("jwk is missing the 'kty' member")]
    MissingKeyType,

    /// The JWKS document has no `keys` array.
    #[error("jwks must contain a 'keys' array")]
    MissingKeys,

    /// The bytes are not valid JSON, or the key cannot be represented as a typed JWK.
    #[error("cannot deserialize json web key")]
    Deserialize(#[from] serde_json::Error),

    /// The key material cannot be turned into a verification key.
    #[error("cannot build decoding key from jwk")]
    DecodingKey(#[from] jsonwebtoken::errors::Error),
}

impl JsonWebKey {
    /// Parses a single JWK JSON object.
    ///
    /// Only top-level members are read. A nested `keys` member inside a single key
    /// is not interpreted.
    ///
    /// # Errors
    ///
    /// Returns [`JsonWebKeyError`] if the bytes are not a JSON object or the
    /// object has no `kty` member.
    pub fn from_jwk_json(jwk_json: &[u8]) -> Result<Self, JsonWebKeyError> {
        let value: Value = serde_json::from_slice(jwk_json)?;
        Self::from_value(&value)
    }

    fn from_value(value: &Value) -> Result<Self, JsonWebKeyError> {
        let object = value.as_object().ok_or(JsonWebKeyError::NotAnObject)?;

        let member = |name: &str| object.get(name).and_then(Value::as_str).map(Arc::<str>::from);

        let kty = member("kty").ok_or(JsonWebKeyError::MissingKeyType)?;
        let jwk_json = serde_json::to_vec(value)?;

        Ok(Self {
            kid: member("kid"),
            kty,
            key_use: member("use"),
            alg: member("alg"),
            jwk_json: Arc::<[u8]>::from(jwk_json),
        })
    }

    /// Returns the key ID (`kid`), if the key has one.
    pub fn key_id(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    /// Returns the key type (`kty`).
    pub fn key_type(&self) -> &str {
        &self.kty
    }

    /// Returns the intended key use (`use`), if present.
    pub fn key_use(&self) -> Option<&str> {
        self.key_use.as_deref()
    }

    /// Returns the algorithm (`alg`), if present.
    pub fn algorithm(&self) -> Option<&str> {
        self.alg.as_deref()
    }

    /// Returns the JWK JSON bytes.
    pub fn jwk_json(&self) -> &[u8] {
        &self.jwk_json
    }

    /// Returns `true` unless the key is explicitly marked for encryption.
    pub fn is_signing_key(&self) -> bool {
        self.key_use() != Some("enc")
    }

    /// Builds a `jsonwebtoken` decoding key from this JWK.
    ///
    /// # Errors
    ///
    /// Returns [`JsonWebKeyError`] if the JWK uses a key type or parameters that
    /// `jsonwebtoken` does not support.
    pub fn decoding_key(&self) -> Result<DecodingKey, JsonWebKeyError> {
        let jwk: Jwk = serde_json::from_slice(&self.jwk_json)?;
        Ok(DecodingKey::from_jwk(&jwk)?)
    }
}

/// An RFC 7517 JSON Web Key Set.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct JsonWebKeySet {
    keys: Vec<Arc<JsonWebKey>>,
}

impl JsonWebKeySet {
    /// Creates an empty key set.
    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Parses a JWKS document (`{"keys": [...]}`).
    ///
    /// # Errors
    ///
    /// Returns [`JsonWebKeyError`] if the document is not valid JSON, has no
    /// `keys` array, or any entry is not a valid JWK.
    ///
    /// # Examples
    ///
    /// ```
    /// use token_trust::configuration::JsonWebKeySet;
    ///
    /// let jwks = br#"{"keys":[{"kty":"oct","kid":"k1","k":"c2VjcmV0"}]}"#;
    /// let set = JsonWebKeySet::from_json(jwks)?;
    /// assert!(set.find("k1").is_some());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_json(jwks: &[u8]) -> Result<Self, JsonWebKeyError> {
        let value: Value = serde_json::from_slice(jwks)?;

        let entries = value
            .get("keys")
            .and_then(Value::as_array)
            .ok_or(JsonWebKeyError::MissingKeys)?;

        let keys = entries
            .iter()
            .map(|entry| JsonWebKey::from_value(entry).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { keys })
    }

    /// Adds a key to the set.
    pub fn add_key(&mut self, key: JsonWebKey) {
        self.keys.push(Arc::new(key));
    }

    /// Returns all keys, in document order.
    pub fn keys(&self) -> &[Arc<JsonWebKey>] {
        &self.keys
    }

    /// Returns the keys usable for signature verification.
    pub fn signing_keys(&self) -> impl Iterator<Item = &Arc<JsonWebKey>> {
        self.keys.iter().filter(|k| k.is_signing_key())
    }

    /// Returns the first key with the given `kid`.
    pub fn find(&self, key_id: &str) -> Option<&Arc<JsonWebKey>> {
        self.keys.iter().find(|k| k.key_id() == Some(key_id))
    }

    /// Returns the number of keys in the set.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the set has no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
