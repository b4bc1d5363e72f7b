use super::errors::LifetimeError;
use super::parameters::ValidationParameters;
use time::OffsetDateTime;

/// Checks a validity window against the parameters' clock, allowing for clock skew.
///
/// Does nothing when lifetime validation is disabled.
///
/// # Errors
///
/// Returns a [`LifetimeError`] when the expiration time is missing but
/// required, the window is inverted, or the current time is outside it.
pub fn validate_lifetime(
    not_before: Option<OffsetDateTime>,
    expires: Option<OffsetDateTime>,
    params: &ValidationParameters,
) -> Result<(), LifetimeError> {
    if !params.validate_lifetime() {
        return Ok(());
    }

    if expires.is_none() && params.require_expiration_time() {
        return Err(LifetimeError::NoExpiration);
    }

    if let (Some(not_before), Some(expires)) = (not_before, expires) {
        if not_before > expires {
            return Err(LifetimeError::InvalidLifetime {
                not_before,
                expires,
            });
        }
    }

    let now = params.clock().now();
    let skew = time::Duration::try_from(params.clock_skew()).unwrap_or(time::Duration::MAX);

    // An out-of-range bound means the window is unbounded on that side.
    if let Some(not_before) = not_before {
        if now.checked_add(skew).is_some_and(|latest| not_before > latest) {
            return Err(LifetimeError::NotYetValid { not_before, now });
        }
    }

    if let Some(expires) = expires {
        if now.checked_sub(skew).is_some_and(|earliest| expires < earliest) {
            return Err(LifetimeError::Expired { expires, now });
        }
    }

    Ok(())
}
