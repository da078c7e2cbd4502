// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Window boundary dates derived from the application date.

use crate::calendar::CalendarDate;
use crate::error::Result;
use crate::period::Period;
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

/// One of the four window starts the timeline is cut at.
///
/// Variants are declared in chronological order of their dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum WindowBoundary {
    /// Start of the trailing five years.
    FiveYear,
    /// Start of the trailing five years as of the end of the application month.
    FiveYearStar,
    /// Start of the trailing twelve months.
    OneYear,
    /// Start of the trailing twelve months as of the end of the application month.
    OneYearStar,
}

impl WindowBoundary {
    pub const ALL: [WindowBoundary; 4] = [
        WindowBoundary::FiveYear,
        WindowBoundary::FiveYearStar,
        WindowBoundary::OneYear,
        WindowBoundary::OneYearStar,
    ];

    /// Index into per-boundary arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether this window is anchored on the last day of the application month.
    pub const fn is_star(self) -> bool {
        matches!(self, WindowBoundary::FiveYearStar | WindowBoundary::OneYearStar)
    }

    pub const fn label(self) -> &'static str {
        match self {
            WindowBoundary::FiveYear => "5 year",
            WindowBoundary::FiveYearStar => "5 year (*)",
            WindowBoundary::OneYear => "12 month",
            WindowBoundary::OneYearStar => "12 month (*)",
        }
    }
}

impl fmt::Display for WindowBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Boundary dates for one run, computed once from the application date.
///
/// Starred dates answer "what if the application were made on the last day
/// of this month instead".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct WindowDates {
    pub application: CalendarDate,
    /// Last day of the application month.
    pub application_star: CalendarDate,
    pub date_5y: CalendarDate,
    pub date_5y_star: CalendarDate,
    pub date_1y: CalendarDate,
    pub date_1y_star: CalendarDate,
}

impl WindowDates {
    /// Derives all boundaries: `application − N years + 1 day`, and the
    /// same anchored on the last day of the application month.
    pub fn new(application: CalendarDate) -> Result<Self> {
        let application_star = application.last_day_of_month();
        Ok(Self {
            application,
            application_star,
            date_5y: years_back(application, 5)?.add_days(1)?,
            date_5y_star: years_back(application_star, 5)?.add_days(1)?,
            date_1y: years_back(application, 1)?.add_days(1)?,
            date_1y_star: years_back(application_star, 1)?.add_days(1)?,
        })
    }

    /// Date at which `boundary`'s window opens.
    pub fn boundary(&self, boundary: WindowBoundary) -> CalendarDate {
        match boundary {
            WindowBoundary::FiveYear => self.date_5y,
            WindowBoundary::FiveYearStar => self.date_5y_star,
            WindowBoundary::OneYear => self.date_1y,
            WindowBoundary::OneYearStar => self.date_1y_star,
        }
    }

    /// The span counted for `boundary`: up to the application date, or to
    /// the month end for the starred windows.
    pub fn window(&self, boundary: WindowBoundary) -> Period {
        let end = if boundary.is_star() {
            self.application_star
        } else {
            self.application
        };
        Period::new(self.boundary(boundary), end)
    }

    /// Whether the application date is already the last day of its month,
    /// in which case the starred figures repeat the plain ones.
    pub fn is_month_end(&self) -> bool {
        self.application == self.application_star
    }

    /// Every date the timeline must be cut at for window accounting.
    pub fn cut_points(&self) -> [CalendarDate; 6] {
        [
            self.date_5y,
            self.date_5y_star,
            self.date_1y,
            self.date_1y_star,
            self.application,
            self.application_star,
        ]
    }
}

/// Same day of month `years` earlier, clamped to the month's last day.
///
/// Only 29 February is affected: it maps to the 28th in common years.
fn years_back(date: CalendarDate, years: i64) -> Result<CalendarDate> {
    let month_start = date.first_day_of_month().add_years(-years)?;
    let month_end = month_start.last_day_of_month();
    if date.day() > month_end.day() {
        Ok(month_end)
    } else {
        CalendarDate::from_ymd(month_start.year(), month_start.month(), date.day())
    }
}
