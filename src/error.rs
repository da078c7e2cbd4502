// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Error types for the residency calculator.
//!
//! Only conditions that stop a run are represented here. Per-row parse
//! failures ([`RowError`](crate::RowError)) and per-leg consistency
//! problems ([`ConsistencyError`](crate::ConsistencyError)) are collected
//! as values and reported at the end.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for residency operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a residency calculation.
#[derive(Error, Debug)]
pub enum Error {
    /// A year/month/day triple that is not a valid Gregorian date.
    #[error("invalid calendar date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i64, month: u32, day: u32 },

    /// Day arithmetic left the representable calendar range.
    #[error("date arithmetic out of range: {0}")]
    DateOutOfRange(String),

    /// The application date argument could not be parsed as `DDMMYY`.
    #[error("invalid application date {0:?}: expected DDMMYY, e.g. 020223 for 2 February 2023")]
    InvalidApplicationDate(String),

    /// No flight is left once cancelled and unparseable rows are removed.
    #[error(
        "insufficient data: no usable flights to establish where the traveller started \
         ({cancelled} cancelled)"
    )]
    InsufficientData { cancelled: usize },

    /// No flight CSV was given and none was found.
    #[error("no flight CSV file found in {0}")]
    NoInputFile(PathBuf),

    /// Reading the flight file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
