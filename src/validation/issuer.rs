use super::errors::IssuerError;
use super::parameters::ValidationParameters;
use crate::configuration::BaseConfiguration;

/// Checks that `issuer` is trusted.
///
/// An issuer is trusted when it equals the configuration's issuer or any of the
/// parameters' valid issuers (exact, case-sensitive match). Does nothing when
/// issuer validation is disabled.
///
/// # Errors
///
/// Returns an [`IssuerError`] when the issuer is missing or untrusted, or when
/// no trusted issuer is configured at all.
pub fn validate_issuer(
    issuer: Option<&str>,
    params: &ValidationParameters,
    configuration: Option<&BaseConfiguration>,
) -> Result<(), IssuerError> {
    if !params.validate_issuer() {
        return Ok(());
    }

    let issuer = issuer
        .filter(|i| !i.is_empty())
        .ok_or(IssuerError::MissingIssuer)?;

    let configured = configuration
        .and_then(BaseConfiguration::issuer)
        .filter(|i| !i.is_empty());

    if configured == Some(issuer) || params.valid_issuers().iter().any(|v| v == issuer) {
        return Ok(());
    }

    let valid_issuers: Vec<String> = configured
        .into_iter()
        .chain(params.valid_issuers().iter().map(String::as_str))
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect();

    if valid_issuers.is_empty() {
        return Err(IssuerError::NoValidIssuers(issuer.to_owned()));
    }

    Err(IssuerError::InvalidIssuer {
        issuer: issuer.to_owned(),
        valid_issuers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUER: &str = "https://issuer.example.com";

    #[test]
    fn configuration_issuer_is_trusted() {
        let configuration = BaseConfiguration::new().with_issuer(ISSUER);
        let params = ValidationParameters::new();
        assert_eq!(validate_issuer(Some(ISSUER), &params, Some(&configuration)), Ok(()));
    }

    #[test]
    fn static_issuers_are_trusted() {
        let params = ValidationParameters::new().with_valid_issuers(["a", ISSUER]);
        assert_eq!(validate_issuer(Some(ISSUER), &params, None), Ok(()));
    }

    #[test]
    fn missing_or_empty_issuer() {
        let params = ValidationParameters::new().with_valid_issuers([ISSUER]);
        assert_eq!(
            validate_issuer(None, &params, None),
            Err(IssuerError::MissingIssuer)
        );
        assert_eq!(
            validate_issuer(Some(""), &params, None),
            Err(IssuerError::MissingIssuer)
        );
    }

    #[test]
    fn untrusted_issuer_lists_every_candidate() {
        let configuration = BaseConfiguration::new().with_issuer(ISSUER);
        let params = ValidationParameters::new().with_valid_issuers(["https://other.example.com"]);
        assert_eq!(
            validate_issuer(Some("https://evil.example.com"), &params, Some(&configuration)),
            Err(IssuerError::InvalidIssuer {
                issuer: "https://evil.example.com".to_owned(),
                valid_issuers: vec![ISSUER.to_owned(), "https://other.example.com".to_owned()],
            })
        );
    }

    #[test]
    fn match_is_case_sensitive() {
        let params = ValidationParameters::new().with_valid_issuers([ISSUER]);
        assert!(validate_issuer(Some(&ISSUER.to_uppercase()), &params, None).is_err());
    }

    #[test]
    fn nothing_configured() {
        let params = ValidationParameters::new();
        assert_eq!(
            validate_issuer(Some(ISSUER), &params, Some(&BaseConfiguration::new())),
            Err(IssuerError::NoValidIssuers(ISSUER.to_owned()))
        );
    }

    #[test]
    fn disabled_check_accepts_anything() {
        let params = ValidationParameters::new().with_validate_issuer(false);
        assert_eq!(validate_issuer(None, &params, None), Ok(()));
    }
}
