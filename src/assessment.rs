// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! End-to-end residency assessment.
//!
//! [`Assessment::compute`] runs the pipeline for one application date:
//! window dates, timeline walk, per-day aggregation. The resulting figures
//! are compared against [`ResidencyLimits`].

use crate::aggregator::{RollingMaximum, WindowAggregator};
use crate::calendar::CalendarDate;
use crate::error::Result;
use crate::flight::FlightLog;
use crate::timeline::{DayTotals, Timeline, TimelineBuilder, WindowTotals};
use crate::windows::WindowDates;
use tracing::info;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Caps on days spent outside the UK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ResidencyLimits {
    /// Trailing twelve months.
    pub twelve_months: i64,
    /// Trailing five years.
    pub five_years: i64,
    /// Any twelve-month period inside the five years.
    pub any_twelve_months: i64,
}

impl Default for ResidencyLimits {
    fn default() -> Self {
        Self {
            twelve_months: 90,
            five_years: 450,
            any_twelve_months: 180,
        }
    }
}

/// Whether a figure stays under its cap.
#[inline]
pub fn within(days: i64, cap: i64) -> bool {
    days < cap
}

/// Share of `cap` used by `days`, in percent.
#[inline]
pub fn percent_of(days: i64, cap: i64) -> f64 {
    if cap == 0 {
        return 0.0;
    }
    100.0 * days as f64 / cap as f64
}

/// The figures of an assessment, without the timeline detail.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ResidencySummary {
    pub windows: WindowDates,
    pub window_totals: WindowTotals,
    pub rolling_maximum: RollingMaximum,
    pub totals: DayTotals,
    pub limits: ResidencyLimits,
    pub consistency_errors: usize,
    pub within_limits: bool,
}

/// A complete run for one application date.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub windows: WindowDates,
    pub timeline: Timeline,
    pub rolling_maximum: RollingMaximum,
    pub limits: ResidencyLimits,
}

impl Assessment {
    pub fn compute(
        log: &FlightLog,
        application: CalendarDate,
        limits: ResidencyLimits,
    ) -> Result<Self> {
        let windows = WindowDates::new(application)?;
        let timeline = TimelineBuilder::build(log, &windows);
        let rolling_maximum =
            WindowAggregator::new(&timeline, &windows)?.max_rolling_twelve_months()?;

        let assessment = Self {
            windows,
            timeline,
            rolling_maximum,
            limits,
        };
        info!(
            application = %application,
            twelve_months = assessment.timeline.window_totals.one_year,
            five_years = assessment.timeline.window_totals.five_year,
            any_twelve_months = assessment.rolling_maximum.days,
            errors = assessment.timeline.errors.len(),
            "assessment computed"
        );
        Ok(assessment)
    }

    pub fn twelve_months(&self) -> i64 {
        self.timeline.window_totals.one_year
    }

    pub fn five_years(&self) -> i64 {
        self.timeline.window_totals.five_year
    }

    pub fn any_twelve_months(&self) -> i64 {
        self.rolling_maximum.days
    }

    /// All three figures under their caps.
    pub fn within_limits(&self) -> bool {
        within(self.twelve_months(), self.limits.twelve_months)
            && within(self.five_years(), self.limits.five_years)
            && within(self.any_twelve_months(), self.limits.any_twelve_months)
    }

    pub fn summary(&self) -> ResidencySummary {
        ResidencySummary {
            windows: self.windows,
            window_totals: self.timeline.window_totals,
            rolling_maximum: self.rolling_maximum,
            totals: self.timeline.totals,
            limits: self.limits,
            consistency_errors: self.timeline.errors.len(),
            within_limits: self.within_limits(),
        }
    }
}
