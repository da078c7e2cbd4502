// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Rolling twelve-month maximum over the five-year span.
//!
//! A per-day list is built from the five-year window start to the end of
//! the application month. A day is marked abroad when it lies strictly
//! inside a gap whose two legs both put the traveller abroad; travel days
//! themselves are not abroad days.
//!
//! The rolling maximum is then taken over month-aligned windows only: the
//! window starting on the 1st of the five-year start month, the one a month
//! later, and so on for [`MONTH_OFFSETS`] windows of twelve whole calendar
//! months each. Windows that start mid-month are not evaluated, so the
//! figure can undershoot the true maximum over arbitrary 12-month periods.

use crate::calendar::CalendarDate;
use crate::error::Result;
use crate::period::Period;
use crate::timeline::Timeline;
use crate::windows::WindowDates;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Number of month-aligned 12-month windows evaluated.
pub const MONTH_OFFSETS: i64 = 50;

/// Length of each rolling window, in calendar months.
const WINDOW_MONTHS: i64 = 12;

/// One calendar day and whether it was spent abroad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayStatus {
    pub date: CalendarDate,
    pub abroad: bool,
}

/// The highest abroad-day count over the evaluated windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RollingMaximum {
    pub days: i64,
    /// First day of the window that reached it.
    pub from: CalendarDate,
    /// Last day (inclusive) of that window.
    pub to: CalendarDate,
}

/// Day-by-day view of the five-year span.
#[derive(Debug, Clone)]
pub struct WindowAggregator {
    start: CalendarDate,
    days: Vec<DayStatus>,
}

impl WindowAggregator {
    /// Builds the per-day list from `date_5y` to the application month end, inclusive.
    pub fn new(timeline: &Timeline, windows: &WindowDates) -> Result<Self> {
        let start = windows.date_5y;
        let ranges: Vec<Period> = timeline
            .abroad_gaps()
            .filter(|gap| gap.end > start)
            .map(|gap| Period::new(gap.start.max(start), gap.end))
            .collect();

        let span = start.days_until(windows.application_star).max(0) as usize;
        let mut days = Vec::with_capacity(span + 1);
        let mut date = start;
        while date <= windows.application_star {
            let abroad = ranges.iter().any(|range| range.strictly_contains(date));
            days.push(DayStatus { date, abroad });
            date = date.add_days(1)?;
        }

        debug!(
            days = days.len(),
            ranges = ranges.len(),
            abroad = days.iter().filter(|d| d.abroad).count(),
            "day list built"
        );
        Ok(Self { start, days })
    }

    pub fn days(&self) -> &[DayStatus] {
        &self.days
    }

    /// Abroad days between `from` and `to`, both inclusive.
    pub fn count_abroad(&self, from: CalendarDate, to: CalendarDate) -> i64 {
        self.days
            .iter()
            .filter(|day| day.abroad && day.date >= from && day.date <= to)
            .count() as i64
    }

    /// The `offset`-th month-aligned window, as inclusive first and last days.
    pub fn month_window(&self, offset: i64) -> Result<(CalendarDate, CalendarDate)> {
        let month_start = self.start.first_day_of_month();
        let from = month_start.add_months(offset)?;
        let to = month_start
            .add_months(offset + WINDOW_MONTHS - 1)?
            .last_day_of_month();
        Ok((from, to))
    }

    /// Maximum abroad-day count over the month-aligned 12-month windows.
    ///
    /// Ties keep the earliest window.
    pub fn max_rolling_twelve_months(&self) -> Result<RollingMaximum> {
        let (from, to) = self.month_window(0)?;
        let mut best = RollingMaximum {
            days: self.count_abroad(from, to),
            from,
            to,
        };
        for offset in 1..MONTH_OFFSETS {
            let (from, to) = self.month_window(offset)?;
            let days = self.count_abroad(from, to);
            if days > best.days {
                best = RollingMaximum { days, from, to };
            }
        }
        debug!(days = best.days, from = %best.from, to = %best.to, "rolling maximum");
        Ok(best)
    }
}
