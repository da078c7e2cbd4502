// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Residency timeline reconstruction.
//!
//! The sorted flight log is walked once. Between two consecutive legs the
//! traveller is wherever the earlier leg landed, so each gap becomes a
//! [`ResidencyInterval`] on the UK side, the abroad side, or (when the two
//! legs disagree) the unknown side. Every gap is cut at the window
//! boundaries from [`WindowDates`] so that the part falling inside each
//! window can be counted on its own.
//!
//! Two kinds of totals come out of the walk:
//!
//! - [`DayTotals`]: every day from the first leg to the application date
//!   goes into exactly one of the UK, abroad or error buckets.
//! - [`WindowTotals`]: abroad days that fall inside each of the four
//!   trailing windows.
//!
//! Before the first leg the traveller is taken to have been on the side
//! that leg departs from. That lead-in is not part of the day totals, but
//! the stretch of it inside a window counts towards that window.

use crate::calendar::CalendarDate;
use crate::consistency::{ConsistencyChecker, ConsistencyError};
use crate::flight::{FlightLeg, FlightLog};
use crate::period::Period;
use crate::windows::{WindowBoundary, WindowDates};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Which side of the border a stretch of time was spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Presence {
    Uk,
    Abroad,
    /// The surrounding legs contradict each other.
    Unknown,
}

impl Presence {
    pub const fn from_uk_flag(is_uk: bool) -> Self {
        if is_uk {
            Presence::Uk
        } else {
            Presence::Abroad
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Presence::Uk => "UK",
            Presence::Abroad => "NON-UK",
            Presence::Unknown => "ERROR",
        }
    }
}

/// A span spent on one side of the border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ResidencyInterval {
    pub period: Period,
    pub presence: Presence,
}

/// Days from the first leg to the application date, by side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DayTotals {
    pub uk: i64,
    pub abroad: i64,
    pub error: i64,
}

impl DayTotals {
    fn add(&mut self, presence: Presence, days: i64) {
        match presence {
            Presence::Uk => self.uk += days,
            Presence::Abroad => self.abroad += days,
            Presence::Unknown => self.error += days,
        }
    }

    pub fn total(&self) -> i64 {
        self.uk + self.abroad + self.error
    }
}

/// Abroad days inside each trailing window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct WindowTotals {
    pub five_year: i64,
    pub five_year_star: i64,
    pub one_year: i64,
    pub one_year_star: i64,
}

impl WindowTotals {
    pub fn get(&self, boundary: WindowBoundary) -> i64 {
        match boundary {
            WindowBoundary::FiveYear => self.five_year,
            WindowBoundary::FiveYearStar => self.five_year_star,
            WindowBoundary::OneYear => self.one_year,
            WindowBoundary::OneYearStar => self.one_year_star,
        }
    }

    fn add(&mut self, boundary: WindowBoundary, days: i64) {
        let slot = match boundary {
            WindowBoundary::FiveYear => &mut self.five_year,
            WindowBoundary::FiveYearStar => &mut self.five_year_star,
            WindowBoundary::OneYear => &mut self.one_year,
            WindowBoundary::OneYearStar => &mut self.one_year_star,
        };
        *slot += days;
    }
}

/// A gap as it was cut up and attributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stay {
    pub presence: Presence,
    /// The gap split at window boundaries, in order. Empty pieces are dropped.
    pub pieces: Vec<Period>,
    /// Window boundaries entered for the first time during this gap.
    pub crossed: Vec<WindowBoundary>,
}

impl Stay {
    pub fn days(&self) -> i64 {
        self.pieces.iter().map(Period::duration_days).sum()
    }
}

/// What happened up to and including one leg of the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineStep {
    /// Position of the leg in the sorted log.
    pub index: usize,
    pub leg: FlightLeg,
    /// Span since the previous leg. For the first leg this is the lead-in
    /// from the earliest window it already lies inside (or empty).
    pub gap: Period,
    pub stay: Stay,
    /// Set on the first leg only.
    pub lead_in: bool,
    /// Window totals after this step.
    pub running: WindowTotals,
}

/// The reconstructed timeline and everything counted along the way.
#[derive(Debug, Clone)]
pub struct Timeline {
    pub steps: Vec<TimelineStep>,
    /// From the last leg up to the application date.
    pub closing: Stay,
    /// From the application date to the end of its month, when those differ.
    pub month_end_tail: Option<Period>,
    /// Every attributed piece in order, lead-in and tail included.
    pub intervals: Vec<ResidencyInterval>,
    pub totals: DayTotals,
    pub window_totals: WindowTotals,
    pub errors: Vec<ConsistencyError>,
}

impl Timeline {
    /// Abroad gaps bounded by two legs that agree the traveller was abroad.
    ///
    /// The lead-in and the open stay after the last leg are not included.
    pub fn abroad_gaps(&self) -> impl Iterator<Item = Period> + '_ {
        self.steps
            .iter()
            .filter(|step| !step.lead_in && step.stay.presence == Presence::Abroad)
            .map(|step| step.gap)
    }

    /// Side of the border after the last leg.
    pub fn final_presence(&self) -> Presence {
        self.closing.presence
    }
}

/// Window boundaries already passed during the walk.
#[derive(Debug, Default, Clone, Copy)]
struct EnteredWindows([bool; 4]);

impl EnteredWindows {
    /// Marks `boundary` entered if `date` is strictly past it and it was
    /// not entered before. Returns whether this call entered it.
    fn enter(
        &mut self,
        boundary: WindowBoundary,
        boundary_date: CalendarDate,
        date: CalendarDate,
    ) -> bool {
        let entered = &mut self.0[boundary.index()];
        if *entered || date <= boundary_date {
            return false;
        }
        *entered = true;
        true
    }
}

/// Walks a flight log and accumulates the timeline.
///
/// # Examples
///
/// ```
/// use ukresidency::{CalendarDate, FlightLog, FlightSheet, TimelineBuilder, WindowDates};
///
/// let sheet = FlightSheet::parse(
///     "01/01/15,DUB,FALSE,LHR,TRUE\n\
///      01/03/20,LHR,TRUE,CDG,FALSE\n\
///      15/03/20,CDG,FALSE,LHR,TRUE\n",
/// );
/// let log = FlightLog::from_records(sheet.records).unwrap();
/// let windows = WindowDates::new(CalendarDate::from_ymd(2020, 10, 10).unwrap()).unwrap();
///
/// let timeline = TimelineBuilder::build(&log, &windows);
/// assert_eq!(timeline.window_totals.one_year, 14);
/// assert!(timeline.errors.is_empty());
/// ```
#[derive(Debug)]
pub struct TimelineBuilder<'w> {
    windows: &'w WindowDates,
    previous_date: Option<CalendarDate>,
    previous_place: Option<String>,
    previous_was_uk: bool,
    entered: EnteredWindows,
    checker: ConsistencyChecker,
    totals: DayTotals,
    window_totals: WindowTotals,
    intervals: Vec<ResidencyInterval>,
    steps: Vec<TimelineStep>,
}

impl<'w> TimelineBuilder<'w> {
    /// Starts a walk with the traveller on the given side of the border.
    pub fn new(windows: &'w WindowDates, starts_in_uk: bool) -> Self {
        Self {
            windows,
            previous_date: None,
            previous_place: None,
            previous_was_uk: starts_in_uk,
            entered: EnteredWindows::default(),
            checker: ConsistencyChecker::new(),
            totals: DayTotals::default(),
            window_totals: WindowTotals::default(),
            intervals: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Walks the whole log. The starting side is the first leg's origin.
    pub fn build(log: &FlightLog, windows: &'w WindowDates) -> Timeline {
        let mut builder = Self::new(windows, log.first().origin_is_uk);
        for (index, leg) in log.legs().iter().enumerate() {
            builder.push_leg(index, leg);
        }
        builder.finish()
    }

    /// Accounts for the gap that ends at `leg`, then moves past it.
    pub fn push_leg(&mut self, index: usize, leg: &FlightLeg) {
        let crossed = self.enter_windows(leg.date);

        let (gap, lead_in) = match self.previous_date {
            Some(previous) => (Period::new(previous, leg.date), false),
            None => {
                let start = crossed
                    .first()
                    .map_or(leg.date, |boundary| self.windows.boundary(*boundary));
                (Period::new(start, leg.date), true)
            }
        };

        let presence = if !lead_in
            && self.checker.check(
                index,
                gap,
                self.previous_place.as_deref(),
                self.previous_was_uk,
                leg,
            ) {
            Presence::Unknown
        } else {
            Presence::from_uk_flag(self.previous_was_uk)
        };

        if !lead_in {
            // Days after the application date are not counted.
            let counted = Period::new(gap.start, gap.end.min(self.windows.application));
            self.totals.add(presence, counted.duration_days());
        }
        let pieces = self.attribute(gap, presence);

        debug!(
            index,
            date = %leg.date,
            presence = presence.label(),
            days = gap.duration_days(),
            crossed = crossed.len(),
            five_year = self.window_totals.five_year,
            one_year = self.window_totals.one_year,
            "leg {} -> {}",
            leg.origin,
            leg.destination
        );

        self.steps.push(TimelineStep {
            index,
            leg: leg.clone(),
            gap,
            stay: Stay {
                presence,
                pieces,
                crossed,
            },
            lead_in,
            running: self.window_totals,
        });

        self.previous_date = Some(leg.date);
        self.previous_place = Some(leg.destination.clone());
        self.previous_was_uk = leg.destination_is_uk;
    }

    /// Closes the walk with the stay from the last leg to the application
    /// date, plus the tail to the end of the application month.
    pub fn finish(mut self) -> Timeline {
        let application = self.windows.application;
        let start = self.previous_date.unwrap_or(application);
        let presence = Presence::from_uk_flag(self.previous_was_uk);

        let crossed = self.enter_windows(application);
        let closing_gap = Period::new(start, application);
        self.totals.add(presence, closing_gap.duration_days());
        let pieces = self.attribute(closing_gap, presence);

        let month_end_tail = if self.windows.is_month_end() {
            None
        } else {
            let tail = Period::new(start.max(application), self.windows.application_star);
            self.attribute(tail, presence);
            Some(tail)
        };

        debug!(
            presence = presence.label(),
            days = closing_gap.duration_days(),
            uk = self.totals.uk,
            abroad = self.totals.abroad,
            error = self.totals.error,
            "timeline closed at {application}"
        );

        Timeline {
            steps: self.steps,
            closing: Stay {
                presence,
                pieces,
                crossed,
            },
            month_end_tail,
            intervals: self.intervals,
            totals: self.totals,
            window_totals: self.window_totals,
            errors: self.checker.into_errors(),
        }
    }

    /// Boundaries first passed at `date`, in chronological order.
    fn enter_windows(&mut self, date: CalendarDate) -> Vec<WindowBoundary> {
        WindowBoundary::ALL
            .into_iter()
            .filter(|boundary| {
                self.entered
                    .enter(*boundary, self.windows.boundary(*boundary), date)
            })
            .collect()
    }

    /// Cuts `span` at the window boundaries, records the pieces, and adds
    /// abroad pieces to every window they fall in.
    fn attribute(&mut self, span: Period, presence: Presence) -> Vec<Period> {
        let pieces = span.split_at_all(&self.windows.cut_points());
        for piece in &pieces {
            self.intervals.push(ResidencyInterval {
                period: *piece,
                presence,
            });
            if presence != Presence::Abroad {
                continue;
            }
            for boundary in WindowBoundary::ALL {
                if let Some(inside) = piece.intersection(&self.windows.window(boundary)) {
                    self.window_totals.add(boundary, inside.duration_days());
                }
            }
        }
        pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> CalendarDate {
        CalendarDate::from_ymd(y, m, d).unwrap()
    }

    fn leg(
        on: CalendarDate,
        origin: &str,
        origin_is_uk: bool,
        destination: &str,
        destination_is_uk: bool,
    ) -> FlightLeg {
        FlightLeg {
            date: on,
            origin: origin.to_string(),
            origin_is_uk,
            destination: destination.to_string(),
            destination_is_uk,
        }
    }

    fn walk(windows: &WindowDates, legs: &[FlightLeg]) -> Timeline {
        let mut builder = TimelineBuilder::new(windows, legs[0].origin_is_uk);
        for (i, l) in legs.iter().enumerate() {
            builder.push_leg(i, l);
        }
        builder.finish()
    }

    fn windows() -> WindowDates {
        WindowDates::new(date(2020, 10, 10)).unwrap()
    }

    #[test]
    fn test_round_trip_inside_twelve_months() {
        let w = windows();
        let t = walk(
            &w,
            &[
                leg(date(2015, 1, 1), "DUB", false, "LHR", true),
                leg(date(2020, 3, 1), "LHR", true, "CDG", false),
                leg(date(2020, 3, 15), "CDG", false, "LHR", true),
            ],
        );
        assert_eq!(t.window_totals.one_year, 14);
        assert_eq!(t.window_totals.five_year, 14);
        assert_eq!(t.window_totals.one_year_star, 14);
        assert_eq!(t.window_totals.five_year_star, 14);
        assert_eq!(t.totals.abroad, 14);
        assert!(t.errors.is_empty());
        assert_eq!(t.final_presence(), Presence::Uk);
    }

    #[test]
    fn test_legs_after_application_are_not_counted() {
        let w = windows();
        let first = date(2015, 1, 1);
        let t = walk(
            &w,
            &[
                leg(first, "DUB", false, "LHR", true),
                leg(date(2020, 3, 1), "LHR", true, "CDG", false),
                leg(date(2020, 3, 15), "CDG", false, "LHR", true),
                leg(date(2020, 12, 1), "LHR", true, "JFK", false),
            ],
        );
        assert_eq!(t.totals.total(), first.days_until(w.application));
        assert_eq!(t.totals.abroad, 14);
        assert_eq!(t.totals.uk, first.days_until(w.application) - 14);
        assert_eq!(t.window_totals.five_year, 14);
        assert_eq!(t.window_totals.one_year, 14);
        assert!(t.closing.pieces.is_empty());
    }

    #[test]
    fn test_totals_cover_first_leg_to_application() {
        let w = windows();
        let first = date(2012, 4, 3);
        let t = walk(
            &w,
            &[
                leg(first, "LHR", true, "CDG", false),
                leg(date(2014, 2, 1), "CDG", false, "LHR", true),
                leg(date(2016, 7, 9), "LHR", true, "JFK", false),
                leg(date(2017, 1, 2), "BOS", true, "LHR", true),
                leg(date(2019, 12, 24), "LHR", true, "WAW", false),
            ],
        );
        assert_eq!(t.errors.len(), 1);
        assert_eq!(t.totals.total(), first.days_until(w.application));
    }

    #[test]
    fn test_gap_straddling_five_year_start_is_split() {
        let w = windows();
        let departed = date(2015, 9, 1);
        let returned = date(2015, 11, 20);
        let t = walk(
            &w,
            &[
                leg(date(2014, 1, 1), "DUB", false, "LHR", true),
                leg(departed, "LHR", true, "CDG", false),
                leg(returned, "CDG", false, "LHR", true),
            ],
        );
        let step = &t.steps[2];
        assert_eq!(
            step.stay.crossed,
            vec![WindowBoundary::FiveYear, WindowBoundary::FiveYearStar]
        );
        assert_eq!(step.stay.pieces.len(), 3);
        assert_eq!(step.stay.days(), departed.days_until(returned));

        let inside = w.date_5y.days_until(returned);
        assert_eq!(t.window_totals.five_year, inside);
        assert_eq!(t.window_totals.five_year_star, w.date_5y_star.days_until(returned));
        assert_eq!(t.window_totals.one_year, 0);
        assert_eq!(
            t.window_totals.five_year + departed.days_until(w.date_5y),
            t.totals.abroad
        );
    }

    #[test]
    fn test_boundary_on_leg_date_is_not_entered() {
        let w = windows();
        let t = walk(
            &w,
            &[
                leg(date(2014, 1, 1), "DUB", false, "LHR", true),
                leg(w.date_5y, "LHR", true, "CDG", false),
                leg(w.date_5y.add_days(10).unwrap(), "CDG", false, "LHR", true),
            ],
        );
        assert!(t.steps[1].stay.crossed.is_empty());
        assert_eq!(t.steps[2].stay.crossed[0], WindowBoundary::FiveYear);
        assert_eq!(t.window_totals.five_year, 10);
        assert_eq!(t.steps[2].running.five_year, 10);
    }

    #[test]
    fn test_each_boundary_crossed_once() {
        let w = windows();
        let t = walk(
            &w,
            &[
                leg(date(2010, 1, 1), "DUB", false, "LHR", true),
                leg(date(2016, 1, 1), "LHR", true, "CDG", false),
                leg(date(2016, 2, 1), "CDG", false, "LHR", true),
                leg(date(2020, 1, 1), "LHR", true, "CDG", false),
                leg(date(2020, 2, 1), "CDG", false, "LHR", true),
            ],
        );
        let crossed: Vec<WindowBoundary> = t
            .steps
            .iter()
            .flat_map(|s| s.stay.crossed.iter().copied())
            .chain(t.closing.crossed.iter().copied())
            .collect();
        assert_eq!(crossed, WindowBoundary::ALL.to_vec());
        assert_eq!(t.window_totals.five_year, 31 + 31);
        assert_eq!(t.window_totals.one_year, 31);
    }

    #[test]
    fn test_consistency_error_diverts_gap() {
        let w = windows();
        let t = walk(
            &w,
            &[
                leg(date(2020, 1, 1), "LHR", true, "CDG", false),
                leg(date(2020, 1, 10), "LHR", true, "DUB", false),
                leg(date(2020, 2, 10), "DUB", false, "LHR", true),
            ],
        );
        assert_eq!(t.errors.len(), 1);
        assert_eq!(t.errors[0].index, 1);
        assert_eq!(t.totals.error, 9);
        assert_eq!(t.steps[1].stay.presence, Presence::Unknown);
        assert_eq!(t.window_totals.one_year, 31);
        assert_eq!(t.totals.abroad, 31);
    }

    #[test]
    fn test_abroad_since_before_window_counts_whole_window() {
        let w = windows();
        let t = walk(
            &w,
            &[
                leg(date(2010, 5, 17), "LIS", false, "EDI", true),
                leg(date(2010, 7, 27), "EDI", true, "GDN", false),
            ],
        );
        assert_eq!(t.window_totals.five_year, w.date_5y.days_until(w.application));
        assert_eq!(t.window_totals.one_year, w.date_1y.days_until(w.application));
        assert_eq!(
            t.window_totals.five_year_star,
            w.date_5y_star.days_until(w.application_star)
        );
        assert_eq!(t.closing.crossed, WindowBoundary::ALL.to_vec());
        assert_eq!(t.month_end_tail, Some(Period::new(w.application, w.application_star)));
        assert_eq!(t.abroad_gaps().count(), 0);
    }

    #[test]
    fn test_lead_in_counts_for_windows_only() {
        let w = windows();
        let first = date(2020, 6, 1);
        let t = walk(&w, &[leg(first, "CDG", false, "LHR", true)]);
        let step = &t.steps[0];
        assert!(step.lead_in);
        assert_eq!(step.gap, Period::new(w.date_5y, first));
        assert_eq!(t.window_totals.five_year, w.date_5y.days_until(first));
        assert_eq!(t.window_totals.one_year, w.date_1y.days_until(first));
        assert_eq!(t.totals.abroad, 0);
        assert_eq!(t.totals.uk, first.days_until(w.application));
        assert_eq!(t.abroad_gaps().count(), 0);
    }

    #[test]
    fn test_intervals_are_contiguous() {
        let w = windows();
        let t = walk(
            &w,
            &[
                leg(date(2012, 1, 1), "DUB", false, "LHR", true),
                leg(date(2016, 3, 1), "LHR", true, "CDG", false),
                leg(date(2020, 3, 15), "CDG", false, "LHR", true),
            ],
        );
        assert!(t
            .intervals
            .windows(2)
            .all(|pair| pair[0].period.end == pair[1].period.start));
        assert_eq!(t.intervals.last().map(|i| i.period.end), Some(w.application_star));
    }
}
