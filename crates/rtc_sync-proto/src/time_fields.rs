// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use core::fmt;
use core::str::FromStr;

use crate::error::ParseError;

/// Largest year accepted by [`TimeFields::new`] (full 4-digit years only).
pub const MAX_YEAR: i32 = 9999;

/// Query keys in the order the node firmware expects them.
pub const QUERY_KEYS: [&str; 6] = ["y", "mo", "d", "h", "mi", "se"];

/// Broken-down wall-clock time as a node's RTC endpoint expects it.
///
/// Fields are private so a value, once built, always satisfies the range
/// invariants: month 1-12, day 1-31 (and valid for the month), hour 0-23,
/// minute and second 0-59. The year is always the full year, never an
/// offset from 2000.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TimeFields {
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), ParseError> {
    if value < min || value > max {
        return Err(ParseError::OutOfRange { field, value });
    }
    Ok(())
}

impl TimeFields {
    /// Create validated time fields.
    ///
    /// Rejects out-of-range values and dates that do not exist in the
    /// proleptic Gregorian calendar.
    ///
    /// ```
    /// use rtc_proto::TimeFields;
    ///
    /// let fields = TimeFields::new(2024, 3, 15, 14, 5, 9).unwrap();
    /// assert_eq!(fields.to_query(), "y=2024&mo=3&d=15&h=14&mi=5&se=9");
    /// assert!(TimeFields::new(2023, 2, 29, 0, 0, 0).is_err());
    /// ```
    pub fn new(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, ParseError> {
        check_range("y", year.into(), 0, MAX_YEAR.into())?;
        check_range("mo", month.into(), 1, 12)?;
        check_range("d", day.into(), 1, 31)?;
        check_range("h", hour.into(), 0, 23)?;
        check_range("mi", minute.into(), 0, 59)?;
        check_range("se", second.into(), 0, 59)?;
        if NaiveDate::from_ymd_opt(year, month.into(), day.into()).is_none() {
            return Err(ParseError::NonexistentDate { year, month, day });
        }
        Ok(TimeFields {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Decompose a calendar date-time. Leap seconds fold into second 59.
    pub(crate) fn from_naive(dt: &NaiveDateTime) -> Self {
        TimeFields {
            year: dt.year(),
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
        }
    }

    fn to_naive(self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month.into(), self.day.into())?.and_hms_opt(
            self.hour.into(),
            self.minute.into(),
            self.second.into(),
        )
    }

    /// Full year, e.g. `2024`.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month of the year, 1-12.
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Day of the month, 1-31.
    pub fn day(&self) -> u8 {
        self.day
    }

    /// Hour of the day, 0-23.
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute of the hour, 0-59.
    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Second of the minute, 0-59.
    pub fn second(&self) -> u8 {
        self.second
    }

    /// The individual `key=value` pairs, one per CoAP Uri-Query option.
    pub fn query_pairs(&self) -> Vec<String> {
        let values = [
            i64::from(self.year),
            self.month.into(),
            self.day.into(),
            self.hour.into(),
            self.minute.into(),
            self.second.into(),
        ];
        QUERY_KEYS
            .iter()
            .zip(values)
            .map(|(key, value)| format!("{key}={value}"))
            .collect()
    }

    /// Render as `y=<year>&mo=<month>&d=<day>&h=<hour>&mi=<minute>&se=<second>`.
    pub fn to_query(&self) -> String {
        self.query_pairs().join("&")
    }

    /// Parse the `&`-joined query representation produced by [`to_query`](Self::to_query).
    pub fn from_query(query: &str) -> Result<Self, ParseError> {
        Self::from_query_pairs(query.split('&'))
    }

    /// Parse individual `key=value` pairs, as carried in Uri-Query options.
    ///
    /// Every key must appear exactly once; values must be plain decimal
    /// integers without sign or whitespace.
    pub fn from_query_pairs<'a, I>(pairs: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut values: [Option<i64>; 6] = [None; 6];
        for pair in pairs {
            let (key, value) = pair.split_once('=').ok_or_else(|| ParseError::MalformedPair {
                pair: pair.to_string(),
            })?;
            let idx = QUERY_KEYS
                .iter()
                .position(|k| *k == key)
                .ok_or_else(|| ParseError::UnknownField {
                    key: key.to_string(),
                })?;
            if values[idx].is_some() {
                return Err(ParseError::DuplicateField {
                    field: QUERY_KEYS[idx],
                });
            }
            values[idx] = Some(parse_decimal(value)?);
        }

        let mut taken = [0i64; 6];
        for (idx, value) in values.iter().enumerate() {
            taken[idx] = value.ok_or(ParseError::MissingField {
                field: QUERY_KEYS[idx],
            })?;
        }
        let [year, month, day, hour, minute, second] = taken;

        check_range("y", year, 0, MAX_YEAR.into())?;
        TimeFields::new(
            year as i32,
            narrow("mo", month)?,
            narrow("d", day)?,
            narrow("h", hour)?,
            narrow("mi", minute)?,
            narrow("se", second)?,
        )
    }

    /// Seconds since the Unix epoch, interpreting the fields as UTC.
    ///
    /// This is the representation the node firmware parses from a request
    /// body. Fails for times before 1970 or after 2106-02-07.
    pub fn to_epoch_secs(&self) -> Result<u32, ParseError> {
        let secs = self
            .to_naive()
            .ok_or(ParseError::EpochOverflow)?
            .and_utc()
            .timestamp();
        u32::try_from(secs).map_err(|_| ParseError::EpochOverflow)
    }

    /// Decompose seconds since the Unix epoch as UTC.
    pub fn from_epoch_secs(secs: u32) -> Self {
        let dt = DateTime::<Utc>::from_timestamp(i64::from(secs), 0).unwrap_or_default();
        Self::from_naive(&dt.naive_utc())
    }

    /// Signed difference `self - other` in seconds.
    pub fn seconds_since(&self, other: &TimeFields) -> Option<i64> {
        Some((self.to_naive()? - other.to_naive()?).num_seconds())
    }
}

fn parse_decimal(text: &str) -> Result<i64, ParseError> {
    let invalid = || ParseError::InvalidNumber {
        text: text.to_string(),
    };
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    text.parse().map_err(|_| invalid())
}

fn narrow(field: &'static str, value: i64) -> Result<u8, ParseError> {
    u8::try_from(value).map_err(|_| ParseError::OutOfRange { field, value })
}

impl fmt::Display for TimeFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl FromStr for TimeFields {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeFields::from_query(s)
    }
}
