//! Time source shared by the configuration manager and the token validators.

use std::fmt::Debug;
use std::time::Duration;
use time::{Date, OffsetDateTime};

/// Supplies the current UTC time.
///
/// The configuration manager and the lifetime validator read time exclusively
/// through this trait so that refresh schedules and token lifetimes can be
/// exercised deterministically.
pub trait Clock: Debug + Send + Sync + 'static {
    /// Returns the current time.
    fn now(&self) -> OffsetDateTime;
}

/// [`Clock`] backed by the operating system's wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

// Scheduling timestamps are kept as unix milliseconds so they fit in an `AtomicI64`.
// `i64::MIN` and `i64::MAX` stand for "the beginning" and "the end" of time.

pub(crate) const MIN_TIMESTAMP: i64 = i64::MIN;

pub(crate) fn to_unix_millis(t: OffsetDateTime) -> i64 {
    i64::try_from(t.unix_timestamp_nanos() / 1_000_000).unwrap_or(if t.year() < 1970 {
        i64::MIN
    } else {
        i64::MAX
    })
}

pub(crate) fn from_unix_millis(millis: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).unwrap_or_else(
        |_| {
            if millis < 0 {
                Date::MIN.midnight().assume_utc()
            } else {
                Date::MAX.midnight().assume_utc()
            }
        },
    )
}

pub(crate) fn duration_millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

pub(crate) fn add_millis(timestamp: i64, d: Duration) -> i64 {
    timestamp.saturating_add(duration_millis(d))
}
