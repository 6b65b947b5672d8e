//! Next-run-time search.
//!
//! Two searches over the same domain: every whole second in
//! `[now, now + 2 * 365 days)`, in real (not wall-clock) time.
//!
//! * [`next_run_time_brute_force`] tests each second in turn.
//! * [`next_run_time`] skips runs of seconds that cannot match, at most one
//!   wall-clock hour at a time, and falls back to per-second testing across
//!   UTC offset changes. Both return the same instant for any deterministic
//!   schedule; schedules with a `Random` field always use brute force.
//!
//! Sub-second parts of `now` are discarded: run times are whole seconds.

use chrono::{Duration, NaiveDateTime, Timelike};

use crate::core::time_spec::{Field, FullTimeSpec};
use crate::util::clock::{whole_seconds, Instant};

/// How far ahead a schedule is searched before giving up.
pub const SEARCH_HORIZON: Duration = Duration::days(2 * 365);

/// First whole second at or after `now` that satisfies `spec`, found by
/// testing every second up to [`SEARCH_HORIZON`].
#[must_use]
pub fn next_run_time_brute_force(spec: &FullTimeSpec, now: Instant) -> Option<Instant> {
    spec.derandomize();
    let now = whole_seconds(now);
    let max = now + SEARCH_HORIZON;
    let mut next = now;
    while next < max {
        if spec.satisfied(&next) {
            return Some(next);
        }
        next += Duration::seconds(1);
    }
    None
}

/// First whole second at or after `now` that satisfies `spec`.
#[must_use]
pub fn next_run_time(spec: &FullTimeSpec, now: Instant) -> Option<Instant> {
    if spec.has_random() {
        return next_run_time_brute_force(spec, now);
    }

    let now = whole_seconds(now);
    let max = now + SEARCH_HORIZON;
    let mut t = now;
    while t < max {
        let wall = t.naive_local();
        let Some(target) = next_candidate(spec, &wall) else {
            return Some(t);
        };
        let step = target - wall;
        let candidate = t + step;

        if candidate.offset() == t.offset() {
            t = candidate;
            continue;
        }

        // The offset changes inside this window; wall-clock arithmetic is
        // unreliable here, so test each second.
        while t < candidate && t < max {
            if spec.satisfied(&t) {
                return Some(t);
            }
            t += Duration::seconds(1);
        }
    }
    None
}

/// Earliest wall-clock time after `wall` (within the same hour or at the next
/// hour boundary) that could satisfy `spec`, or `None` if `wall` itself does.
fn next_candidate(spec: &FullTimeSpec, wall: &NaiveDateTime) -> Option<NaiveDateTime> {
    let hour_start = wall
        .with_minute(0)
        .and_then(|w| w.with_second(0))
        .unwrap_or(*wall);
    let next_hour = hour_start + Duration::hours(1);

    let day_ok = [Field::MonthDay, Field::Month, Field::Weekday]
        .into_iter()
        .all(|f| spec.field(f).satisfied(f.value_of(wall)));
    if !day_ok || !spec.hour.satisfied(wall.hour()) {
        return Some(next_hour);
    }

    let minute = wall.minute();
    let Some(m) = spec.min.next_at_or_after(minute, 59) else {
        return Some(next_hour);
    };
    if m > minute {
        return Some(hour_start + Duration::minutes(i64::from(m)));
    }

    let second = wall.second();
    match spec.sec.next_at_or_after(second, 59) {
        Some(s) if s == second => None,
        Some(s) => Some(*wall + Duration::seconds(i64::from(s - second))),
        None => Some(hour_start + Duration::minutes(i64::from(minute) + 1)),
    }
}
