//! Compact JWS parsing without signature verification.

use super::{SecurityToken, TokenError};
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use zeroize::Zeroize;

/// A JWT whose header and claims have been decoded but whose signature has
/// **not** been verified.
///
/// Only the members needed to pick verification keys and to diagnose a failed
/// verification are extracted. The serialized token is zeroized on drop and is
/// never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct JwtToken {
    alg: Algorithm,
    kid: Option<String>,
    typ: Option<String>,
    claims: Claims,
    not_before: Option<OffsetDateTime>,
    expires: Option<OffsetDateTime>,
    token: Token,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
struct Header {
    #[serde(default)]
    kid: Option<String>,
    #[serde(default)]
    typ: Option<String>,
    alg: String,
}

/// Registered claims read from the payload.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize)]
pub struct Claims {
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    nbf: Option<i64>,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    iat: Option<i64>,
}

impl Claims {
    /// Returns the `iss` claim.
    pub fn iss(&self) -> Option<&str> {
        self.iss.as_deref()
    }

    /// Returns the `sub` claim.
    pub fn sub(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    /// Returns the `nbf` claim (seconds since the epoch).
    pub const fn nbf(&self) -> Option<i64> {
        self.nbf
    }

    /// Returns the `exp` claim (seconds since the epoch).
    pub const fn exp(&self) -> Option<i64> {
        self.exp
    }

    /// Returns the `iat` claim (seconds since the epoch).
    pub const fn iat(&self) -> Option<i64> {
        self.iat
    }
}

#[derive(Clone, Eq, PartialEq, Zeroize)]
#[zeroize(drop)]
struct Token {
    inner: String,
}

impl From<&str> for Token {
    fn from(token: &str) -> Self {
        Self {
            inner: token.to_owned(),
        }
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        self.inner.as_ref()
    }
}

impl JwtToken {
    /// Parses a compact JWT without performing signature verification.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] if:
    /// - the token is not a 3-part JWT (`header.payload.signature`),
    /// - header/claims are not valid base64url or JSON,
    /// - the `alg` header is missing, `none`, or unknown,
    /// - the optional `typ` header is present but not `JWT` or `JOSE`
    ///   (case-insensitive, optionally prefixed with `application/`),
    /// - `nbf` or `exp` is outside the representable time range.
    pub fn parse_insecure(token: &str) -> Result<Self, TokenError> {
        Self::from_str(token)
    }

    /// Returns the serialized token.
    pub fn token(&self) -> &str {
        self.token.as_ref()
    }

    /// Returns the `alg` header.
    pub const fn algorithm(&self) -> Algorithm {
        self.alg
    }

    /// Returns the `kid` header.
    pub fn key_id(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    /// Returns the `typ` header.
    pub fn token_type(&self) -> Option<&str> {
        self.typ.as_deref()
    }

    /// Returns the decoded claims (untrusted).
    pub const fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Returns the `iss` claim.
    pub fn issuer(&self) -> Option<&str> {
        self.claims.iss()
    }

    /// Returns the `nbf` claim.
    pub const fn not_before(&self) -> Option<OffsetDateTime> {
        self.not_before
    }

    /// Returns the `exp` claim.
    pub const fn expires(&self) -> Option<OffsetDateTime> {
        self.expires
    }
}

impl SecurityToken for JwtToken {
    fn key_id(&self) -> Option<&str> {
        self.key_id()
    }

    fn issuer(&self) -> Option<&str> {
        self.issuer()
    }

    fn not_before(&self) -> Option<OffsetDateTime> {
        self.not_before
    }

    fn expires(&self) -> Option<OffsetDateTime> {
        self.expires
    }
}

impl fmt::Debug for JwtToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtToken")
            .field("alg", &self.alg)
            .field("kid", &self.kid)
            .field("typ", &self.typ)
            .field("claims", &self.claims)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl FromStr for JwtToken {
    type Err = TokenError;

    /// Creates a new [`JwtToken`] from `token` without signature verification.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mut it = token.split('.');
        let header_b64 = it.next().ok_or(TokenError::InvalidJwtFormat)?;
        let claims_b64 = it.next().ok_or(TokenError::InvalidJwtFormat)?;
        let _sig_b64 = it.next().ok_or(TokenError::InvalidJwtFormat)?;
        if it.next().is_some() {
            return Err(TokenError::InvalidJwtFormat);
        }

        let header_json = decode_b64url_to_vec(header_b64)?;
        let claims_json = decode_b64url_to_vec(claims_b64)?;

        let header: Header =
            serde_json::from_slice(&header_json).map_err(TokenError::InvalidJson)?;
        let claims: Claims =
            serde_json::from_slice(&claims_json).map_err(TokenError::InvalidJson)?;

        if let Some(t) = header.typ.as_deref() {
            if !is_jwt_type(t) {
                return Err(TokenError::InvalidTyp(t.to_owned()));
            }
        }

        let alg = Algorithm::from_str(&header.alg)
            .map_err(|_| TokenError::UnsupportedAlgorithm(header.alg.clone()))?;

        let not_before = claims.nbf.map(timestamp).transpose()?;
        let expires = claims.exp.map(timestamp).transpose()?;

        Ok(Self {
            alg,
            kid: header.kid,
            typ: header.typ,
            claims,
            not_before,
            expires,
            token: Token::from(token),
        })
    }
}

fn is_jwt_type(typ: &str) -> bool {
    let typ = typ
        .get(..12)
        .filter(|prefix| prefix.eq_ignore_ascii_case("application/"))
        .map_or(typ, |_| &typ[12..]);
    typ.eq_ignore_ascii_case("JWT") || typ.eq_ignore_ascii_case("JOSE")
}

fn timestamp(seconds: i64) -> Result<OffsetDateTime, TokenError> {
    OffsetDateTime::from_unix_timestamp(seconds)
        .map_err(|time::error::ComponentRange { .. }| TokenError::InvalidTimestamp(seconds))
}

/// Maximum size for a JWT segment (header or claims) after base64url decoding.
const MAX_JWT_SEGMENT_SIZE: usize = 64 * 1024;

/// Decode base64url (no padding) into bytes, bounded by [`MAX_JWT_SEGMENT_SIZE`].
fn decode_b64url_to_vec(input: &str) -> Result<Vec<u8>, TokenError> {
    use base64ct::{Base64UrlUnpadded, Encoding as _};

    if input.len() > MAX_JWT_SEGMENT_SIZE * 4 / 3 {
        return Err(TokenError::InvalidBase64);
    }

    let mut buf = vec![0u8; input.len()];
    let len = Base64UrlUnpadded::decode(input, &mut buf)
        .map_err(|_| TokenError::InvalidBase64)?
        .len();

    if len > MAX_JWT_SEGMENT_SIZE {
        return Err(TokenError::InvalidBase64);
    }

    buf.truncate(len);
    Ok(buf)
}
