//! Schedule model: one predicate per calendar field, six fields per schedule.
//!
//! A [`FullTimeSpec`] is the cron-like schedule attached to every job. It is
//! parsed once when the job file is loaded and never changes afterwards; the
//! only lazily-resolved piece is a [`TimeSpec::Random`] field, which picks its
//! concrete value on first use and keeps it for the life of the owning job.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, Timelike};
use rand::Rng;

use crate::core::{JobberError, Result};

/// Wildcard token.
pub const TIME_WILDCARD: &str = "*";

/// One of the six calendar fields a schedule constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Second of minute, 0-59.
    Second,
    /// Minute of hour, 0-59.
    Minute,
    /// Hour of day, 0-23.
    Hour,
    /// Day of month, 1-31.
    MonthDay,
    /// Month of year, 1-12.
    Month,
    /// Day of week, 0 (Sunday) - 6 (Saturday).
    Weekday,
}

impl Field {
    /// Fields in the order they appear in schedule text.
    pub const ALL: [Self; 6] = [
        Self::Second,
        Self::Minute,
        Self::Hour,
        Self::MonthDay,
        Self::Month,
        Self::Weekday,
    ];

    /// Name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Second => "sec",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::MonthDay => "month day",
            Self::Month => "month",
            Self::Weekday => "weekday",
        }
    }

    /// Inclusive bounds of valid values.
    #[must_use]
    pub const fn bounds(self) -> (u32, u32) {
        match self {
            Self::Second | Self::Minute => (0, 59),
            Self::Hour => (0, 23),
            Self::MonthDay => (1, 31),
            Self::Month => (1, 12),
            Self::Weekday => (0, 6),
        }
    }

    /// Parse `text` as a spec for this field.
    pub fn parse(self, text: &str) -> Result<TimeSpec> {
        let (min, max) = self.bounds();
        parse_field(text, self.name(), min, max)
    }

    /// Extract this field's value from a calendar instant.
    pub fn value_of<T: Datelike + Timelike>(self, t: &T) -> u32 {
        match self {
            Self::Second => t.second(),
            Self::Minute => t.minute(),
            Self::Hour => t.hour(),
            Self::MonthDay => t.day(),
            Self::Month => t.month(),
            Self::Weekday => t.weekday().num_days_from_sunday(),
        }
    }
}

/// Predicate over a single calendar field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSpec {
    /// Matches every value.
    Wildcard,
    /// Matches exactly one value.
    One(u32),
    /// Matches any value in an explicit set (from a list, range or step).
    Set {
        /// Text the set was parsed from, kept for display.
        desc: String,
        /// Sorted, deduplicated members.
        vals: Vec<u32>,
    },
    /// Matches one value drawn at random from `vals`, frozen on first use.
    Random {
        /// Text the spec was parsed from.
        desc: String,
        /// Candidate values.
        vals: Vec<u32>,
        /// The drawn value, once drawn.
        picked: OnceLock<u32>,
    },
}

impl TimeSpec {
    /// Whether `value` satisfies this spec.
    ///
    /// A `Random` spec draws its value here if it has not been drawn yet.
    #[must_use]
    pub fn satisfied(&self, value: u32) -> bool {
        match self {
            Self::Wildcard => true,
            Self::One(v) => *v == value,
            Self::Set { vals, .. } => vals.binary_search(&value).is_ok(),
            Self::Random { .. } => self.derandomize() == Some(value),
        }
    }

    /// Draw the value of a `Random` spec if not yet drawn; returns the value.
    ///
    /// Non-random specs return `None`.
    pub fn derandomize(&self) -> Option<u32> {
        match self {
            Self::Random { vals, picked, .. } => Some(*picked.get_or_init(|| {
                let idx = rand::rng().random_range(0..vals.len());
                vals[idx]
            })),
            _ => None,
        }
    }

    /// The value drawn by a `Random` spec, if any.
    #[must_use]
    pub fn picked_value(&self) -> Option<u32> {
        match self {
            Self::Random { picked, .. } => picked.get().copied(),
            _ => None,
        }
    }

    /// Whether this spec is `Wildcard`.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Whether this spec is `Random`.
    #[must_use]
    pub const fn is_random(&self) -> bool {
        matches!(self, Self::Random { .. })
    }

    /// Smallest satisfying value `>= from` within `[from, max]`.
    pub(crate) fn next_at_or_after(&self, from: u32, max: u32) -> Option<u32> {
        match self {
            Self::Wildcard => (from <= max).then_some(from),
            Self::One(v) => (*v >= from && *v <= max).then_some(*v),
            Self::Set { vals, .. } => vals.iter().copied().find(|v| *v >= from && *v <= max),
            Self::Random { .. } => self.derandomize().filter(|v| *v >= from && *v <= max),
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wildcard => f.write_str(TIME_WILDCARD),
            Self::One(v) => write!(f, "{v}"),
            Self::Set { desc, .. } => f.write_str(desc),
            Self::Random { desc, picked, .. } => match picked.get() {
                Some(v) => write!(f, "{desc}->{v}"),
                None => f.write_str(desc),
            },
        }
    }
}

fn field_err(field: &'static str, text: &str, reason: impl Into<String>) -> JobberError {
    JobberError::InvalidTimeSpec {
        field,
        text: text.to_string(),
        reason: reason.into(),
    }
}

fn parse_value(text: &str, field: &'static str, whole: &str, min: u32, max: u32) -> Result<u32> {
    let v: u32 = text
        .parse()
        .map_err(|_| field_err(field, whole, format!("'{text}' is not a number")))?;
    if v < min || v > max {
        return Err(field_err(
            field,
            whole,
            format!("value {v} out of range [{min}, {max}]"),
        ));
    }
    Ok(v)
}

fn parse_range(text: &str, field: &'static str, whole: &str, min: u32, max: u32) -> Result<(u32, u32)> {
    let Some((lo, hi)) = text.split_once('-') else {
        let v = parse_value(text, field, whole, min, max)?;
        return Ok((v, v));
    };
    let lo = parse_value(lo, field, whole, min, max)?;
    let hi = parse_value(hi, field, whole, min, max)?;
    if lo > hi {
        return Err(field_err(field, whole, format!("empty range {lo}-{hi}")));
    }
    Ok((lo, hi))
}

/// Parse one schedule field whose valid values are `[min, max]`.
///
/// Accepted forms:
///
/// | Text      | Result                                     |
/// |-----------|--------------------------------------------|
/// | `*`       | [`TimeSpec::Wildcard`]                     |
/// | `5`       | [`TimeSpec::One`]                          |
/// | `1,4,7`   | [`TimeSpec::Set`] (items may be ranges)    |
/// | `0-5`     | [`TimeSpec::Set`], inclusive               |
/// | `*/15`    | [`TimeSpec::Set`] of `min, min+15, ...`    |
/// | `R`       | [`TimeSpec::Random`] over `[min, max]`     |
/// | `R2-4`    | [`TimeSpec::Random`] over `[2, 4]`         |
pub fn parse_field(text: &str, field: &'static str, min: u32, max: u32) -> Result<TimeSpec> {
    if text == TIME_WILDCARD {
        return Ok(TimeSpec::Wildcard);
    }

    if let Some(step) = text.strip_prefix("*/") {
        let step: u32 = step
            .parse()
            .map_err(|_| field_err(field, text, format!("'{step}' is not a step")))?;
        if step == 0 {
            return Err(field_err(field, text, "step must be positive"));
        }
        let vals = (min..=max).step_by(step as usize).collect();
        return Ok(TimeSpec::Set {
            desc: text.to_string(),
            vals,
        });
    }

    if let Some(range) = text.strip_prefix('R') {
        let (lo, hi) = if range.is_empty() {
            (min, max)
        } else {
            parse_range(range, field, text, min, max)?
        };
        return Ok(TimeSpec::Random {
            desc: text.to_string(),
            vals: (lo..=hi).collect(),
            picked: OnceLock::new(),
        });
    }

    if !text.contains([',', '-']) {
        return parse_value(text, field, text, min, max).map(TimeSpec::One);
    }

    let mut vals = Vec::new();
    for item in text.split(',') {
        if item.is_empty() {
            return Err(field_err(field, text, "empty list item"));
        }
        let (lo, hi) = parse_range(item, field, text, min, max)?;
        vals.extend(lo..=hi);
    }
    vals.sort_unstable();
    vals.dedup();
    Ok(TimeSpec::Set {
        desc: text.to_string(),
        vals,
    })
}

/// A six-field schedule: second, minute, hour, month day, month, weekday.
///
/// The default value (all wildcards) matches every second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullTimeSpec {
    /// Second of minute.
    pub sec: TimeSpec,
    /// Minute of hour.
    pub min: TimeSpec,
    /// Hour of day.
    pub hour: TimeSpec,
    /// Day of month.
    pub mday: TimeSpec,
    /// Month of year.
    pub month: TimeSpec,
    /// Day of week, Sunday = 0.
    pub wday: TimeSpec,
}

impl Default for FullTimeSpec {
    fn default() -> Self {
        Self {
            sec: TimeSpec::Wildcard,
            min: TimeSpec::Wildcard,
            hour: TimeSpec::Wildcard,
            mday: TimeSpec::Wildcard,
            month: TimeSpec::Wildcard,
            wday: TimeSpec::Wildcard,
        }
    }
}

impl FullTimeSpec {
    /// Parse whitespace-separated schedule text.
    ///
    /// Missing trailing fields default to wildcards; the empty string is
    /// "every second". More than six fields is an error.
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split_whitespace().collect();
        if parts.len() > Field::ALL.len() {
            return Err(JobberError::InvalidTimeSpec {
                field: "time",
                text: text.to_string(),
                reason: "excess elements in 'time' field".into(),
            });
        }

        let mut spec = Self::default();
        for (field, part) in Field::ALL.into_iter().zip(parts) {
            *spec.field_mut(field) = field.parse(part)?;
        }
        Ok(spec)
    }

    /// The spec for one field.
    #[must_use]
    pub const fn field(&self, field: Field) -> &TimeSpec {
        match field {
            Field::Second => &self.sec,
            Field::Minute => &self.min,
            Field::Hour => &self.hour,
            Field::MonthDay => &self.mday,
            Field::Month => &self.month,
            Field::Weekday => &self.wday,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut TimeSpec {
        match field {
            Field::Second => &mut self.sec,
            Field::Minute => &mut self.min,
            Field::Hour => &mut self.hour,
            Field::MonthDay => &mut self.mday,
            Field::Month => &mut self.month,
            Field::Weekday => &mut self.wday,
        }
    }

    /// Whether every field is satisfied by the corresponding part of `t`.
    pub fn satisfied<T: Datelike + Timelike>(&self, t: &T) -> bool {
        Field::ALL
            .into_iter()
            .all(|f| self.field(f).satisfied(f.value_of(t)))
    }

    /// Draw the value of every `Random` field that has not been drawn yet.
    pub fn derandomize(&self) {
        for f in Field::ALL {
            self.field(f).derandomize();
        }
    }

    /// Whether any field is `Random`.
    #[must_use]
    pub fn has_random(&self) -> bool {
        Field::ALL.into_iter().any(|f| self.field(f).is_random())
    }
}

impl FromStr for FullTimeSpec {
    type Err = JobberError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FullTimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.sec, self.min, self.hour, self.mday, self.month, self.wday
        )
    }
}
