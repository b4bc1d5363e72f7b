//! Refresh-interval defaults and floors used by the configuration manager.

use std::time::Duration;

/// Default interval between automatic refreshes of a cached configuration (12 hours).
pub const DEFAULT_AUTOMATIC_REFRESH_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// Default minimum gap between two honored explicit refresh requests (5 minutes).
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Smallest accepted automatic refresh interval (5 minutes).
pub const MINIMUM_AUTOMATIC_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Smallest accepted explicit refresh interval (1 second).
pub const MINIMUM_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Automatic refresh interval meaning "never refresh on a timer".
///
/// A manager configured with this value also ignores explicit refresh requests.
pub const INFINITE_REFRESH_INTERVAL: Duration = Duration::MAX;

/// Upper bound (exclusive) of the random delay added after a successful refresh (60 minutes).
pub const MAX_REFRESH_JITTER: Duration = Duration::from_secs(60 * 60);

/// Default tolerance applied when comparing token lifetimes with the current time (5 minutes).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(5 * 60);
