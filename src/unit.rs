//! Month unit parsing and arithmetic
//!
//! A [`MonthUnit`] is the `(year, month)` pair that identifies one archive
//! fetch and one checkpoint file. Units are totally ordered by year, then month.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// One calendar month, the atomic unit of fetching and checkpointing
///
/// # Examples
///
/// ```
/// use news_archive_harvester::unit::MonthUnit;
///
/// let unit: MonthUnit = "2020-12".parse().unwrap();
/// assert_eq!(unit.next().to_string(), "2021-01");
/// assert_eq!(unit.previous().to_string(), "2020-11");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthUnit {
    // Field order matters: the derived Ord compares year first.
    year: i32,
    month: u32,
}

impl MonthUnit {
    /// Create a unit, rejecting months outside `1..=12`
    pub fn new(year: i32, month: u32) -> Result<Self, UnitError> {
        if !(1..=12).contains(&month) {
            return Err(UnitError::InvalidMonth(month));
        }
        if !(0..=9999).contains(&year) {
            return Err(UnitError::InvalidYear(year));
        }
        Ok(Self { year, month })
    }

    /// Compile-time constructor for constants; panics on an invalid month
    pub(crate) const fn const_new(year: i32, month: u32) -> Self {
        assert!(month >= 1 && month <= 12);
        Self { year, month }
    }

    /// The month containing today's date (UTC)
    pub fn current() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    /// The month containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Derive the unit from an archive timestamp string
    ///
    /// Accepts RFC 3339 (`2020-01-31T23:10:00Z`), the archive's compact offset
    /// form (`2020-01-31T23:10:00+0000`), a naive datetime, or anything that
    /// starts with a `YYYY-MM-DD` date. Offsets are honored: the month is the
    /// one of the timestamp's own local date.
    pub fn from_timestamp_str(s: &str) -> Result<Self, UnitError> {
        let s = s.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::from_date(dt.date_naive()));
        }
        if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
            return Ok(Self::from_date(dt.date_naive()));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Ok(Self::from_date(dt.date()));
        }

        s.get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
            .map(Self::from_date)
            .ok_or_else(|| UnitError::InvalidTimestamp(s.to_string()))
    }

    /// Year component
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month component (1-12)
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following month; December rolls over to January of the next year
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding month; January rolls back to December of the previous year
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Every unit from `start` to `end`, both inclusive, in chronological order
    ///
    /// Empty when `start > end`.
    pub fn range_inclusive(start: Self, end: Self) -> impl Iterator<Item = Self> {
        std::iter::successors(Some(start), |unit| Some(unit.next())).take_while(move |u| *u <= end)
    }

    /// Compact numeric form (`202001`), used for gauges
    pub fn as_number(&self) -> i64 {
        i64::from(self.year) * 100 + i64::from(self.month)
    }
}

impl fmt::Display for MonthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthUnit {
    type Err = UnitError;

    /// Parse `YYYY-MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| UnitError::InvalidFormat(s.to_string()))?;

        let year: i32 = year
            .parse()
            .map_err(|_| UnitError::InvalidFormat(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| UnitError::InvalidFormat(s.to_string()))?;

        Self::new(year, month)
    }
}

/// Errors that can occur while building a month unit
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UnitError {
    /// Input was not `YYYY-MM`
    #[error("invalid month unit '{0}': expected YYYY-MM")]
    InvalidFormat(String),

    /// Month outside 1-12
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    /// Year outside the four-digit range
    #[error("year must be between 0 and 9999, got {0}")]
    InvalidYear(i32),

    /// Timestamp could not be parsed into a date
    #[error("unparseable timestamp: '{0}'")]
    InvalidTimestamp(String),
}
