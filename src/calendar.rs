// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Civil calendar dates.
//!
//! [`CalendarDate`] is a plain Gregorian date with no time of day and no
//! time zone. It wraps [`chrono::NaiveDate`] and adds the month arithmetic
//! the residency windows are built from:
//!
//! - [`CalendarDate::first_day_of_month`] / [`CalendarDate::last_day_of_month`]
//! - [`CalendarDate::add_days`]
//! - [`CalendarDate::add_months`] / [`CalendarDate::add_years`]
//!
//! Month shifts keep the day of month and fail with
//! [`Error::InvalidDate`] when the target month is too short (31 January
//! plus one month). Callers that need to cross months of different lengths
//! normalise to the first or last day of the month first.

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Accepted departure timestamp layouts, tried in order.
const DEPARTURE_DATETIME_FORMAT: &str = "%d/%m/%y %H:%M";
const DEPARTURE_DATE_FORMATS: [&str; 2] = ["%d/%m/%y", "%d/%m/%Y"];

/// Layout of the application date given on the command line.
const APPLICATION_FORMAT: &str = "%d%m%y";

/// A Gregorian calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    // ── constructors ──────────────────────────────────────────────────

    /// Builds a date from its components, rejecting impossible dates.
    ///
    /// ```
    /// use ukresidency::CalendarDate;
    ///
    /// assert!(CalendarDate::from_ymd(2024, 2, 29).is_ok());
    /// assert!(CalendarDate::from_ymd(2023, 2, 29).is_err());
    /// ```
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or(Error::InvalidDate {
                year: i64::from(year),
                month,
                day,
            })
    }

    /// Parses a departure timestamp from the flight CSV.
    ///
    /// Accepts `DD/MM/YY HH:MM`, `DD/MM/YY` and `DD/MM/YYYY`, in that
    /// order. The time of day is validated and then dropped.
    pub fn parse_departure(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, DEPARTURE_DATETIME_FORMAT) {
            return Some(Self(datetime.date()));
        }
        DEPARTURE_DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
            .map(Self)
    }

    /// Parses the `DDMMYY` application date argument.
    pub fn parse_application(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.len() != 6 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidApplicationDate(text.to_string()));
        }
        NaiveDate::parse_from_str(trimmed, APPLICATION_FORMAT)
            .map(Self)
            .map_err(|_| Error::InvalidApplicationDate(text.to_string()))
    }

    // ── accessors ─────────────────────────────────────────────────────

    #[inline]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    #[inline]
    pub fn month(self) -> u32 {
        self.0.month()
    }

    #[inline]
    pub fn day(self) -> u32 {
        self.0.day()
    }

    // ── month arithmetic ──────────────────────────────────────────────

    /// The 1st of this date's month.
    pub fn first_day_of_month(self) -> Self {
        Self(self.0 - TimeDelta::days(i64::from(self.0.day0())))
    }

    /// The last day of this date's month.
    ///
    /// Day 28 exists in every month and day 28 + 4 always lands in the
    /// following month; stepping back by that date's day of month gives
    /// the last day of the starting month.
    pub fn last_day_of_month(self) -> Self {
        let day_28 = self.0 - TimeDelta::days(i64::from(self.0.day()) - 28);
        let next_month = day_28 + TimeDelta::days(4);
        Self(next_month - TimeDelta::days(i64::from(next_month.day())))
    }

    /// Shifts by `days` calendar days (negative goes back).
    pub fn add_days(self, days: i64) -> Result<Self> {
        TimeDelta::try_days(days)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map(Self)
            .ok_or_else(|| Error::DateOutOfRange(format!("{self} + {days} days")))
    }

    /// Shifts by `months` months keeping the day of month.
    ///
    /// ```
    /// use ukresidency::CalendarDate;
    ///
    /// let d = CalendarDate::from_ymd(2020, 11, 15).unwrap();
    /// assert_eq!(d.add_months(3).unwrap(), CalendarDate::from_ymd(2021, 2, 15).unwrap());
    ///
    /// let end_of_jan = CalendarDate::from_ymd(2021, 1, 31).unwrap();
    /// assert!(end_of_jan.add_months(1).is_err());
    /// ```
    pub fn add_months(self, months: i64) -> Result<Self> {
        let index = i64::from(self.year()) * 12 + i64::from(self.0.month0()) + months;
        let year = index.div_euclid(12);
        let month = index.rem_euclid(12) as u32 + 1;
        let day = self.day();
        let year = i32::try_from(year).map_err(|_| Error::InvalidDate { year, month, day })?;
        Self::from_ymd(year, month, day)
    }

    /// Shifts by whole years; same as `add_months(12 * years)`.
    pub fn add_years(self, years: i64) -> Result<Self> {
        let months = years
            .checked_mul(12)
            .ok_or_else(|| Error::DateOutOfRange(format!("{self} + {years} years")))?;
        self.add_months(months)
    }

    /// Number of days from `self` to `later` (negative if `later` is earlier).
    #[inline]
    pub fn days_until(self, later: Self) -> i64 {
        later.0.signed_duration_since(self.0).num_days()
    }

    /// Two-digit-year rendering, `DD/MM/YY`.
    pub fn short(self) -> impl fmt::Display {
        self.0.format("%d/%m/%y")
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%d/%m/%Y"))
    }
}

// Serialised as an ISO `YYYY-MM-DD` string.
#[cfg(feature = "serde")]
impl Serialize for CalendarDate {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0.format("%Y-%m-%d"))
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}
