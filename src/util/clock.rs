//! Wall-clock helpers.

use std::time::Duration;

use chrono::{DateTime, Local, SubsecRound};

/// A point in local wall-clock time.
pub type Instant = DateTime<Local>;

/// Current local time.
#[must_use]
pub fn now() -> Instant {
    Local::now()
}

/// Drop the sub-second part of `t`.
#[must_use]
pub fn whole_seconds(t: Instant) -> Instant {
    t.trunc_subsecs(0)
}

/// Time remaining from `now` until `t`, zero if `t` has passed.
#[must_use]
pub fn until(now: Instant, t: Instant) -> Duration {
    (t - now).to_std().unwrap_or(Duration::ZERO)
}

/// Seconds since the Unix epoch.
#[must_use]
pub fn unix_secs(t: &Instant) -> i64 {
    t.timestamp()
}
