//! Date-based amounts and zoned times that `chrono` has no type for.
//!
//! Both types print and parse their ISO-8601 text through [`Display`] and
//! [`FromStr`], which is also their JSON form.

use core::fmt;
use core::str::FromStr;

use chrono::{FixedOffset, NaiveTime, TimeDelta, Timelike};
use thiserror::Error;

use crate::convert::{format_offset, parse_offset};

/// Text that is not a valid [`Period`] or [`OffsetTime`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} `{text}`")]
pub struct ParseTimeError {
    kind: &'static str,
    text: String,
}

impl ParseTimeError {
    fn new(kind: &'static str, text: &str) -> Self {
        Self {
            kind,
            text: text.to_owned(),
        }
    }
}

// -----------------------------------------------------------------------------
// Period

/// A date-based amount of time: years, months and days, `P1Y2M3D`.
///
/// The parts are kept apart, `P1M` is not `P30D`. Parsing also accepts
/// weeks (`P2W` reads as 14 days) and a leading sign that negates every part.
///
/// # Examples
///
/// ```
/// use jb_bind::time::Period;
///
/// let period: Period = "P1M10D".parse().unwrap();
/// assert_eq!(period, Period::new(0, 1, 10));
/// assert_eq!(Period::new(1, 0, -3).to_string(), "P1Y-3D");
/// assert_eq!(Period::ZERO.to_string(), "P0D");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Period {
    pub years: i32,
    pub months: i32,
    pub days: i32,
}

impl Period {
    pub const ZERO: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(years: i32, months: i32, days: i32) -> Self {
        Self {
            years,
            months,
            days,
        }
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("P0D");
        }
        f.write_str("P")?;
        for (count, unit) in [(self.years, 'Y'), (self.months, 'M'), (self.days, 'D')] {
            if count != 0 {
                write!(f, "{count}{unit}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Period {
    type Err = ParseTimeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let fail = || ParseTimeError::new("period", text);

        let (negate, rest) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let mut rest = rest.strip_prefix(['P', 'p']).ok_or_else(fail)?;
        if rest.is_empty() {
            return Err(fail());
        }

        let mut period = Self::ZERO;
        let mut last_rank = 0;
        while !rest.is_empty() {
            let end = rest.find(|c: char| c.is_ascii_alphabetic()).ok_or_else(fail)?;
            let count: i32 = rest[..end].parse().map_err(|_| fail())?;
            let unit = rest.as_bytes()[end].to_ascii_uppercase();
            let rank = match unit {
                b'Y' => 1,
                b'M' => 2,
                b'W' => 3,
                b'D' => 4,
                _ => return Err(fail()),
            };
            if rank <= last_rank {
                return Err(fail());
            }
            last_rank = rank;
            match unit {
                b'Y' => period.years = count,
                b'M' => period.months = count,
                b'W' => period.days = count.checked_mul(7).ok_or_else(fail)?,
                _ => period.days = period.days.checked_add(count).ok_or_else(fail)?,
            }
            rest = &rest[end + 1..];
        }

        if negate {
            period = Self::new(
                period.years.checked_neg().ok_or_else(fail)?,
                period.months.checked_neg().ok_or_else(fail)?,
                period.days.checked_neg().ok_or_else(fail)?,
            );
        }
        Ok(period)
    }
}

// -----------------------------------------------------------------------------
// OffsetTime

/// A time of day at a fixed UTC offset, `10:15:30+01:00`.
///
/// # Examples
///
/// ```
/// use chrono::{FixedOffset, NaiveTime};
/// use jb_bind::time::OffsetTime;
///
/// let time = OffsetTime::new(
///     NaiveTime::from_hms_opt(10, 15, 30).unwrap(),
///     FixedOffset::east_opt(3600).unwrap(),
/// );
/// assert_eq!(time.to_string(), "10:15:30+01:00");
/// assert_eq!("10:15:30+01:00".parse::<OffsetTime>().unwrap(), time);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffsetTime {
    pub time: NaiveTime,
    pub offset: FixedOffset,
}

impl OffsetTime {
    #[inline]
    pub const fn new(time: NaiveTime, offset: FixedOffset) -> Self {
        Self { time, offset }
    }

    /// The same instant expressed at UTC.
    pub fn to_utc(&self) -> NaiveTime {
        self.time - TimeDelta::seconds(i64::from(self.offset.local_minus_utc()))
    }
}

impl fmt::Display for OffsetTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.time.hour(),
            self.time.minute(),
            self.time.second()
        )?;
        let nanos = self.time.nanosecond() % 1_000_000_000;
        if nanos > 0 {
            let fraction = format!("{nanos:09}");
            write!(f, ".{}", fraction.trim_end_matches('0'))?;
        }
        f.write_str(&format_offset(self.offset.local_minus_utc()))
    }
}

impl FromStr for OffsetTime {
    type Err = ParseTimeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let fail = || ParseTimeError::new("offset time", text);
        let split = text.rfind(['Z', 'z', '+', '-']).ok_or_else(fail)?;
        let (time, offset) = text.split_at(split);
        let time = time.parse::<NaiveTime>().map_err(|_| fail())?;
        let offset = parse_offset(offset)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(fail)?;
        Ok(Self::new(time, offset))
    }
}
