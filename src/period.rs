// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Date spans.
//!
//! A [`Period`] is a half-open range `[start, end)` of calendar dates. Its
//! duration is the number of nights between the two ends, which is how
//! the gap between two flights is counted.

use crate::calendar::CalendarDate;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Half-open span of calendar dates `[start, end)`.
///
/// # Examples
///
/// ```
/// use ukresidency::{CalendarDate, Period};
///
/// let start = CalendarDate::from_ymd(2020, 3, 1).unwrap();
/// let end = CalendarDate::from_ymd(2020, 3, 15).unwrap();
/// assert_eq!(Period::new(start, end).duration_days(), 14);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Period {
    pub start: CalendarDate,
    pub end: CalendarDate,
}

impl Period {
    /// Creates a new span between two dates.
    pub fn new(start: CalendarDate, end: CalendarDate) -> Self {
        Period { start, end }
    }

    /// A zero-length span anchored at `date`.
    pub fn at(date: CalendarDate) -> Self {
        Period::new(date, date)
    }

    /// Days from start to end, clamped at zero for reversed spans.
    pub fn duration_days(&self) -> i64 {
        self.start.days_until(self.end).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// `start <= date < end`.
    pub fn contains(&self, date: CalendarDate) -> bool {
        self.start <= date && date < self.end
    }

    /// `start < date < end`: the date lies inside without touching either end.
    pub fn strictly_contains(&self, date: CalendarDate) -> bool {
        self.start < date && date < self.end
    }

    /// Returns the overlapping sub-span between `self` and `other`.
    ///
    /// Spans that merely touch (`a.end == b.start`) do not intersect.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);

        if start < end {
            Some(Self::new(start, end))
        } else {
            None
        }
    }

    /// Cuts the span at `at` into `[start, at)` and `[at, end)`.
    ///
    /// A side that would be empty is returned as `None`, so a cut outside
    /// the span (or on one of its ends) leaves it whole on one side.
    pub fn split_at(&self, at: CalendarDate) -> (Option<Self>, Option<Self>) {
        if self.is_empty() {
            return (None, None);
        }
        if at <= self.start {
            return (None, Some(*self));
        }
        if at >= self.end {
            return (Some(*self), None);
        }
        (
            Some(Self::new(self.start, at)),
            Some(Self::new(at, self.end)),
        )
    }

    /// Splits the span at every cut point lying strictly inside it.
    ///
    /// The pieces are returned in chronological order and together cover
    /// the span exactly once. `cuts` need not be sorted.
    pub fn split_at_all(&self, cuts: &[CalendarDate]) -> Vec<Self> {
        let mut sorted: Vec<CalendarDate> = cuts
            .iter()
            .copied()
            .filter(|c| self.strictly_contains(*c))
            .collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut pieces = Vec::with_capacity(sorted.len() + 1);
        let mut rest = *self;
        for cut in sorted {
            if let (Some(before), Some(after)) = rest.split_at(cut) {
                pieces.push(before);
                rest = after;
            }
        }
        if !rest.is_empty() {
            pieces.push(rest);
        }
        pieces
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}
