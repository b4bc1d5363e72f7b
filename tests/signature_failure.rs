//! Integration tests for signature-failure classification.
//!
//! Tokens are minted with `jsonwebtoken`, verified against each candidate key
//! the way a validator would, and the collected failures are classified.
use base64ct::{Base64UrlUnpadded, Encoding as _};
use jsonwebtoken::{Algorithm, EncodingKey, Header, Validation};
use std::collections::HashSet;
use std::sync::Arc;
use time::OffsetDateTime;
use token_trust::configuration::{BaseConfiguration, JsonWebKey};
use token_trust::token::JwtToken;
use token_trust::validation::{
    classify_jwt_signature_failure, IssuerError, KeyFailureLog, LifetimeError, ValidationError,
    ValidationParameters,
};

const ISSUER: &str = "https://login.example.com";

fn oct_key(kid: &str, secret: &[u8]) -> Arc<JsonWebKey> {
    let k = Base64UrlUnpadded::encode_string(secret);
    let json = format!(r#"{{"kty":"oct","kid":"{kid}","alg":"HS256","k":"{k}"}}"#);
    Arc::new(JsonWebKey::from_jwk_json(json.as_bytes()).unwrap())
}

fn mint(kid: &str, secret: &[u8], iss: &str, exp_offset: i64) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_owned());
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let claims = serde_json::json!({ "iss": iss, "sub": "alice", "exp": now + exp_offset });
    jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(secret)).unwrap()
}

/// Tries every key; returns the failure log, or `None` if a key verified the token.
fn verify(token: &str, keys: &[Arc<JsonWebKey>]) -> Option<KeyFailureLog> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims = HashSet::new();

    let mut failures = KeyFailureLog::new();
    for key in keys {
        let decoding_key = key.decoding_key().unwrap();
        match jsonwebtoken::decode::<serde_json::Value>(token, &decoding_key, &validation) {
            Ok(_) => return None,
            Err(e) => failures.record(key.key_id(), e),
        }
    }
    Some(failures)
}

fn configuration() -> BaseConfiguration {
    BaseConfiguration::new()
        .with_issuer(ISSUER)
        .with_signing_keys([
            oct_key("c1", b"configuration-secret-one"),
            oct_key("c2", b"configuration-secret-two"),
        ])
}

fn params() -> ValidationParameters {
    ValidationParameters::new().with_issuer_signing_keys([oct_key("p1", b"parameter-secret")])
}

fn candidate_keys(
    configuration: &BaseConfiguration,
    params: &ValidationParameters,
) -> Vec<Arc<JsonWebKey>> {
    params
        .issuer_signing_keys()
        .iter()
        .chain(configuration.signing_keys())
        .cloned()
        .collect()
}

#[test]
fn trusted_key_verifies() {
    let configuration = configuration();
    let raw = mint("c2", b"configuration-secret-two", ISSUER, 3600);
    assert!(verify(&raw, &candidate_keys(&configuration, &params())).is_none());
}

#[test]
fn unknown_key_is_reported_with_counts() {
    let configuration = configuration();
    let params = params();
    let raw = mint("rotated", b"rotated-secret", ISSUER, 3600);

    let failures = verify(&raw, &candidate_keys(&configuration, &params)).unwrap();
    assert_eq!(failures.len(), 3);

    let token = JwtToken::parse_insecure(&raw).unwrap();
    let err = classify_jwt_signature_failure(&token, &params, Some(&configuration), failures);

    let ValidationError::SignatureKeyNotFound(e) = err else {
        panic!("expected key-not-found");
    };
    assert_eq!(e.key_id(), Some("rotated"));
    assert_eq!(e.validation_key_count(), 1);
    assert_eq!(e.configuration_key_count(), Some(2));
    let tried: Vec<_> = e.key_failures().entries().iter().filter_map(|f| f.key_id()).collect();
    assert_eq!(tried, vec!["p1", "c1", "c2"]);
    assert!(e.key_failures().entries().iter().all(|f| f.error() == "InvalidSignature"));
    assert!(!e.to_string().contains(&raw));
}

#[test]
fn expired_token_reports_lifetime_first() {
    let configuration = configuration();
    let params = params();
    let raw = mint("rotated", b"rotated-secret", "https://evil.example.com", -3600);

    let failures = verify(&raw, &candidate_keys(&configuration, &params)).unwrap();
    let token = JwtToken::parse_insecure(&raw).unwrap();
    let err = classify_jwt_signature_failure(&token, &params, Some(&configuration), failures);
    assert!(matches!(
        err,
        ValidationError::Lifetime(LifetimeError::Expired { .. })
    ));
}

#[test]
fn untrusted_issuer_is_reported_before_key() {
    let configuration = configuration();
    let params = params();
    let raw = mint("rotated", b"rotated-secret", "https://evil.example.com", 3600);

    let failures = verify(&raw, &candidate_keys(&configuration, &params)).unwrap();
    let token = JwtToken::parse_insecure(&raw).unwrap();
    let err = classify_jwt_signature_failure(&token, &params, Some(&configuration), failures);
    assert!(matches!(
        err,
        ValidationError::Issuer(IssuerError::InvalidIssuer { ref issuer, .. })
            if issuer == "https://evil.example.com"
    ));
}
