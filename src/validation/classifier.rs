use super::errors::{FailedToken, SignatureKeyNotFoundError, ValidationError};
use super::issuer::validate_issuer;
use super::key_failures::KeyFailureLog;
use super::lifetime::validate_lifetime;
use super::parameters::ValidationParameters;
use crate::configuration::BaseConfiguration;
use crate::token::{JwtToken, SamlAssertion, SecurityToken};

/// Explains why a JWT signature could not be verified by any candidate key.
///
/// Call this only after every key has been tried. The token's lifetime is
/// checked first and its issuer second, against the configuration's issuer and
/// the parameters' valid issuers. If both pass, the missing key is the real
/// cause and [`ValidationError::SignatureKeyNotFound`] is returned; otherwise
/// the lifetime error wins over the issuer error.
///
/// # Examples
///
/// ```
/// use token_trust::token::JwtToken;
/// use token_trust::validation::{
///     classify_jwt_signature_failure, KeyFailureLog, ValidationError, ValidationParameters,
/// };
///
/// // {"alg":"HS256","kid":"k9"} . {"iss":"https://issuer.example.com","exp":4102444800}
/// let token = JwtToken::parse_insecure(
///     "eyJhbGciOiJIUzI1NiIsImtpZCI6Ims5In0.\
///      eyJpc3MiOiJodHRwczovL2lzc3Vlci5leGFtcGxlLmNvbSIsImV4cCI6NDEwMjQ0NDgwMH0.sig",
/// )?;
/// let params = ValidationParameters::new().with_valid_issuers(["https://issuer.example.com"]);
///
/// let mut failures = KeyFailureLog::new();
/// failures.record(Some("k1"), "InvalidSignature");
///
/// let err = classify_jwt_signature_failure(&token, &params, None, failures);
/// assert!(matches!(
///     err,
///     ValidationError::SignatureKeyNotFound(ref e) if e.key_id() == Some("k9")
/// ));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn classify_jwt_signature_failure(
    token: &JwtToken,
    params: &ValidationParameters,
    configuration: Option<&BaseConfiguration>,
    key_failures: KeyFailureLog,
) -> ValidationError {
    if let Err(e) = check_prerequisites(token, params, configuration) {
        return e;
    }

    SignatureKeyNotFoundError {
        key_id: token.key_id().map(str::to_owned),
        validation_key_count: params.issuer_signing_keys().len(),
        configuration_key_count: configuration.map(|c| c.signing_keys().len()),
        key_descriptor: None,
        key_failures,
        token: FailedToken::Jwt(token.clone()),
    }
    .into()
}

/// Explains why a SAML assertion signature could not be verified by any candidate key.
///
/// Same precedence as [`classify_jwt_signature_failure`]. There is no
/// configuration: the issuer is checked against the parameters' valid issuers
/// only, and `key_descriptor` (a rendering of the signature's `KeyInfo`) is
/// embedded in place of a configuration key count.
pub fn classify_saml_signature_failure(
    assertion: &SamlAssertion,
    key_descriptor: &str,
    params: &ValidationParameters,
    key_failures: KeyFailureLog,
) -> ValidationError {
    if let Err(e) = check_prerequisites(assertion, params, None) {
        return e;
    }

    SignatureKeyNotFoundError {
        key_id: assertion.key_id().map(str::to_owned),
        validation_key_count: params.issuer_signing_keys().len(),
        configuration_key_count: None,
        key_descriptor: Some(key_descriptor.to_owned()),
        key_failures,
        token: FailedToken::Saml(assertion.clone()),
    }
    .into()
}

/// Runs the lifetime check, then the issuer check only if the lifetime is valid.
fn check_prerequisites<T: SecurityToken>(
    token: &T,
    params: &ValidationParameters,
    configuration: Option<&BaseConfiguration>,
) -> Result<(), ValidationError> {
    let lifetime = validate_lifetime(token.not_before(), token.expires(), params);
    let issuer = match lifetime {
        Ok(()) => validate_issuer(token.issuer(), params, configuration),
        Err(_) => Ok(()),
    };

    match (lifetime, issuer) {
        (Err(e), _) => Err(e.into()),
        (Ok(()), Err(e)) => Err(e.into()),
        (Ok(()), Ok(())) => Ok(()),
    }
}
