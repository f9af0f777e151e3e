//! Time and timestamp helpers.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// UTC timestamp used for `last_updated`, `created_at`, event times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Return the current wall-clock time in the given timezone.
///
/// Condition evaluation compares clock-of-day in the controller's
/// configured timezone, not UTC.
#[must_use]
pub fn now_in<Tz: TimeZone>(timezone: &Tz) -> NaiveDateTime {
    Utc::now().with_timezone(timezone).naive_local()
}
