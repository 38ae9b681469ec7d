// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Calendar keys and timestamps.
//!
//! Day documents are keyed by a month (`YYYYMM`) and a date (`YYYY-MM-DD`).
//! Both keys are validated on construction so every path built from them is
//! well formed.

use crate::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, UtcOffset};

/// A submission month, formatted as `YYYYMM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u8,
}

impl MonthKey {
    /// Creates a month key from its components.
    ///
    /// # Errors
    ///
    /// Returns an error if the year is outside `1..=9999` or the month is
    /// outside `1..=12`.
    pub fn new(year: i32, month: u8) -> Result<Self, DomainError> {
        if !(1..=9999).contains(&year) {
            return Err(DomainError::InvalidMonthKey(format!("{year:04}{month:02}")));
        }
        if !(1..=12).contains(&month) {
            return Err(DomainError::InvalidMonthKey(format!("{year:04}{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// Returns the month containing `date`.
    #[must_use]
    pub const fn of(date: DateKey) -> Self {
        Self {
            year: date.0.year(),
            month: date.0.month() as u8,
        }
    }

    /// The calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// The calendar month (1-12).
    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    /// Returns whether `date` falls within this month.
    #[must_use]
    pub fn contains(&self, date: DateKey) -> bool {
        Self::of(date) == *self
    }

    /// Returns the first day of the month.
    ///
    /// # Errors
    ///
    /// Returns an error if the date cannot be represented.
    pub fn first_day(&self) -> Result<DateKey, DomainError> {
        let month: Month = Month::try_from(self.month)
            .map_err(|_| DomainError::InvalidMonthKey(self.to_string()))?;
        Date::from_calendar_date(self.year, month, 1)
            .map(DateKey)
            .map_err(|_| DomainError::InvalidMonthKey(self.to_string()))
    }

    /// Enumerates every date of the month in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the first day cannot be represented.
    pub fn days(&self) -> Result<Vec<DateKey>, DomainError> {
        let mut current: Date = self.first_day()?.0;
        let mut days: Vec<DateKey> = Vec::with_capacity(31);
        loop {
            days.push(DateKey(current));
            match current.next_day() {
                Some(next) if next.month() as u8 == self.month => current = next,
                _ => break,
            }
        }
        Ok(days)
    }
}

impl FromStr for MonthKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::InvalidMonthKey(s.to_string()));
        }
        let year: i32 = s[..4]
            .parse()
            .map_err(|_| DomainError::InvalidMonthKey(s.to_string()))?;
        let month: u8 = s[4..]
            .parse()
            .map_err(|_| DomainError::InvalidMonthKey(s.to_string()))?;
        Self::new(year, month).map_err(|_| DomainError::InvalidMonthKey(s.to_string()))
    }
}

impl TryFrom<String> for MonthKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

/// A calendar date, formatted as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(Date);

impl DateKey {
    /// Wraps a `time::Date`.
    #[must_use]
    pub const fn from_date(date: Date) -> Self {
        Self(date)
    }

    /// The underlying date.
    #[must_use]
    pub const fn date(&self) -> Date {
        self.0
    }

    /// The month this date belongs to.
    #[must_use]
    pub const fn month_key(&self) -> MonthKey {
        MonthKey::of(*self)
    }
}

impl FromStr for DateKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 10 {
            return Err(DomainError::InvalidDateKey(s.to_string()));
        }
        Date::parse(s, format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|_| DomainError::InvalidDateKey(s.to_string()))
    }
}

impl TryFrom<String> for DateKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateKey> for String {
    fn from(value: DateKey) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for DateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            self.0.month() as u8,
            self.0.day()
        )
    }
}

/// A UTC instant serialized as an RFC 3339 string.
///
/// Used for `submittedAt`, `updatedAt` and `decidedAt`; ordering is by
/// instant, which is what the staleness fence compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// The current instant.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Wraps an `OffsetDateTime`, normalizing it to UTC.
    #[must_use]
    pub fn from_offset_date_time(value: OffsetDateTime) -> Self {
        Self(value.to_offset(UtcOffset::UTC))
    }

    /// Parses an RFC 3339 timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not valid RFC 3339.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        OffsetDateTime::parse(value, &Rfc3339)
            .map(Self::from_offset_date_time)
            .map_err(|_| DomainError::InvalidTimestamp(value.to_string()))
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub fn unix_millis(&self) -> i64 {
        i64::try_from(self.0.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
    }

    /// Formats the timestamp as RFC 3339.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.0.to_string())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: String = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
