// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! UK residency day counter
//!
//! Reconstructs from a flight log when the traveller was in the UK and
//! when abroad, and counts the days abroad that matter for a British
//! citizenship or passport application:
//!
//! | Figure | Window | Usual cap |
//! |--------|--------|-----------|
//! | trailing 12 months | `application − 1 year + 1 day` … application | 90 days |
//! | trailing 5 years | `application − 5 years + 1 day` … application | 450 days |
//! | any 12 months | month-aligned 12-month windows inside the 5 years | 180 days |
//!
//! # Pipeline
//!
//! - [`FlightSheet`]: CSV rows parsed into [`FlightRecord`]s, bad rows kept as [`RowError`]s.
//! - [`FlightLog`]: cancelled flights removed, legs sorted by date.
//! - [`WindowDates`]: window boundaries derived from the application date.
//! - [`TimelineBuilder`]: walks the legs, yields a [`Timeline`] of
//!   [`ResidencyInterval`]s and the day counts, flagging [`ConsistencyError`]s.
//! - [`WindowAggregator`]: per-day list and the rolling 12-month maximum.
//! - [`Assessment`]: all of the above for one application date.
//! - [`ReportFormatter`]: text report, coloured through a [`Style`].
//!
//! # Example
//!
//! ```
//! use ukresidency::{Assessment, CalendarDate, FlightLog, FlightSheet, ResidencyLimits};
//!
//! let sheet = FlightSheet::parse(
//!     "17/05/10 10:40,LIS,FALSE,EDI,TRUE,RyanAir,FR1111,FALSE\n\
//!      27/07/10 13:10,EDI,TRUE,GDN,FALSE,RyanAir,FR2222,FALSE\n",
//! );
//! let log = FlightLog::from_records(sheet.records).unwrap();
//! let application = CalendarDate::parse_application("101020").unwrap();
//!
//! let assessment = Assessment::compute(&log, application, ResidencyLimits::default()).unwrap();
//! assert_eq!(assessment.five_years(), 1826);
//! assert!(!assessment.within_limits());
//! ```

mod aggregator;
mod assessment;
mod calendar;
mod consistency;
mod error;
mod flight;
mod period;
mod report;
mod timeline;
mod windows;

// ── Re-exports ────────────────────────────────────────────────────────────

pub use aggregator::{DayStatus, RollingMaximum, WindowAggregator, MONTH_OFFSETS};
pub use assessment::{percent_of, within, Assessment, ResidencyLimits, ResidencySummary};
pub use calendar::CalendarDate;
pub use consistency::{ConsistencyChecker, ConsistencyError};
pub use error::{Error, Result};
pub use flight::{
    parse_flag, FlightLeg, FlightLog, FlightRecord, FlightSheet, RowError, RowErrorKind,
};
pub use period::Period;
pub use report::{days_as_years, Colored, Plain, ReportFormatter, Style, Tone};
pub use timeline::{
    DayTotals, Presence, ResidencyInterval, Stay, Timeline, TimelineBuilder, TimelineStep,
    WindowTotals,
};
pub use windows::{WindowBoundary, WindowDates};
