// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Flight records and the chronological flight log.
//!
//! Input rows look like
//!
//! ```text
//! DepartDateTime,DepartPlace,IsUK,ArrivePlace,IsUK,Airline,FlNumber,WasCancelled
//! 17/05/10 10:40,HHN,FALSE,EDI,TRUE,RyanAir,FR4382,TRUE
//! ```
//!
//! [`FlightSheet::parse`] turns the text into [`FlightRecord`]s, keeping
//! rows it cannot read as [`RowError`]s. [`FlightLog::from_records`] then
//! drops cancelled flights and sorts the rest by date.

use crate::calendar::CalendarDate;
use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Minimum number of columns: date, origin, origin-is-UK, destination,
/// destination-is-UK. Airline, flight number and cancelled are optional.
const REQUIRED_FIELDS: usize = 5;

/// One flight segment as used by the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightLeg {
    pub date: CalendarDate,
    pub origin: String,
    pub origin_is_uk: bool,
    pub destination: String,
    pub destination_is_uk: bool,
}

/// A parsed CSV row, including the display-only columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightRecord {
    /// 1-based line number in the source file.
    pub line: usize,
    pub leg: FlightLeg,
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub cancelled: bool,
}

/// Why a row was left out of the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowErrorKind {
    /// The departure column matched none of the accepted layouts.
    BadDate(String),
    /// Fewer than the five required columns.
    MissingFields(usize),
}

/// A CSV row that could not be turned into a flight. Not fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: usize,
    pub raw: String,
    pub kind: RowErrorKind,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RowErrorKind::BadDate(text) => write!(
                f,
                "CSV line {}: flight date {text:?} has wrong format",
                self.line
            ),
            RowErrorKind::MissingFields(found) => write!(
                f,
                "CSV line {}: expected at least {REQUIRED_FIELDS} fields, found {found}",
                self.line
            ),
        }
    }
}

/// `TRUE`, `True` and `1` are true; anything else is false.
pub fn parse_flag(text: &str) -> bool {
    matches!(text.trim(), "TRUE" | "True" | "1")
}

fn optional_text(field: Option<&str>) -> Option<String> {
    field
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl FlightRecord {
    /// Parses one CSV line. `line` is the 1-based line number used in reports.
    pub fn parse_line(line: usize, raw: &str) -> std::result::Result<Self, RowError> {
        let fields: Vec<&str> = raw.split(',').collect();
        let error = |kind| RowError {
            line,
            raw: raw.to_string(),
            kind,
        };

        if fields.len() < REQUIRED_FIELDS {
            return Err(error(RowErrorKind::MissingFields(fields.len())));
        }

        let date = CalendarDate::parse_departure(fields[0])
            .ok_or_else(|| error(RowErrorKind::BadDate(fields[0].trim().to_string())))?;

        Ok(FlightRecord {
            line,
            leg: FlightLeg {
                date,
                origin: fields[1].trim().to_string(),
                origin_is_uk: parse_flag(fields[2]),
                destination: fields[3].trim().to_string(),
                destination_is_uk: parse_flag(fields[4]),
            },
            airline: optional_text(fields.get(5).copied()),
            flight_number: optional_text(fields.get(6).copied()),
            cancelled: fields.get(7).is_some_and(|f| parse_flag(f)),
        })
    }
}

/// Every row read from a flight file, in file order.
#[derive(Debug, Clone, Default)]
pub struct FlightSheet {
    pub records: Vec<FlightRecord>,
    pub row_errors: Vec<RowError>,
}

impl FlightSheet {
    /// Parses CSV text. Blank lines are skipped; bad rows are kept as errors.
    pub fn parse(text: &str) -> Self {
        let mut sheet = FlightSheet::default();
        for (idx, raw) in text.lines().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            match FlightRecord::parse_line(idx + 1, raw) {
                Ok(record) => sheet.records.push(record),
                Err(err) => {
                    warn!("{err}");
                    sheet.row_errors.push(err);
                }
            }
        }
        info!(
            rows = sheet.records.len() + sheet.row_errors.len(),
            errors = sheet.row_errors.len(),
            "flight sheet parsed"
        );
        sheet
    }

    /// Reads and parses a flight file.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn cancelled_count(&self) -> usize {
        self.records.iter().filter(|r| r.cancelled).count()
    }

    pub fn flight_count(&self) -> usize {
        self.records.len() - self.cancelled_count()
    }
}

/// Non-cancelled legs sorted by date, plus the cancelled rows set aside.
///
/// Never empty: without at least one leg there is no way to tell whether
/// the traveller started in the UK or abroad.
#[derive(Debug, Clone)]
pub struct FlightLog {
    legs: Vec<FlightLeg>,
    cancelled: Vec<FlightRecord>,
}

impl FlightLog {
    /// Splits off cancelled flights and sorts the rest by date.
    ///
    /// The sort is stable, so flights on the same day keep their input order.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = FlightRecord>,
    {
        let (cancelled, kept): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|record| record.cancelled);

        let mut legs: Vec<FlightLeg> = kept.into_iter().map(|record| record.leg).collect();
        if legs.is_empty() {
            return Err(Error::InsufficientData {
                cancelled: cancelled.len(),
            });
        }
        legs.sort_by_key(|leg| leg.date);

        info!(
            legs = legs.len(),
            cancelled = cancelled.len(),
            "flight log built"
        );
        Ok(FlightLog { legs, cancelled })
    }

    /// Legs in chronological order.
    pub fn legs(&self) -> &[FlightLeg] {
        &self.legs
    }

    pub fn first(&self) -> &FlightLeg {
        &self.legs[0]
    }

    pub fn cancelled(&self) -> &[FlightRecord] {
        &self.cancelled
    }
}
