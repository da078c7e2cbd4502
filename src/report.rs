// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Human-readable report.
//!
//! Rendering is kept apart from the computation: the formatter reads an
//! [`Assessment`] and the parsed [`FlightSheet`], and every piece of
//! colour goes through a [`Style`]. [`Colored`] paints with ANSI escapes,
//! [`Plain`] leaves text untouched (for `--no-color`, pipes and tests).

use crate::assessment::{percent_of, within, Assessment};
use crate::calendar::CalendarDate;
use crate::flight::{FlightLog, FlightSheet, RowError};
use crate::period::Period;
use crate::timeline::{Presence, Stay, TimelineStep};
use crate::windows::WindowBoundary;
use owo_colors::OwoColorize;
use qtty::{Days, Year};
use std::io::{self, Write};
use std::path::Path;

const RULE: &str = "-----------------------------------------------";

/// What a piece of text means, independent of how it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Good,
    Bad,
    Uk,
    Abroad,
    Marker,
    Muted,
    Heading,
    /// Inverted label in front of an error line.
    Badge,
    Missing,
}

/// Rendering capabilities the report relies on.
pub trait Style {
    fn paint(&self, tone: Tone, text: &str) -> String;

    /// Green when `ok`, red otherwise.
    fn pass_fail(&self, ok: bool, text: &str) -> String {
        self.paint(if ok { Tone::Good } else { Tone::Bad }, text)
    }

    /// A place code, coloured by which side of the border it is on.
    fn place(&self, is_uk: bool, code: &str) -> String {
        self.pass_fail(is_uk, code)
    }
}

/// ANSI colours via `owo-colors`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Colored;

impl Style for Colored {
    fn paint(&self, tone: Tone, text: &str) -> String {
        match tone {
            Tone::Good => text.bright_green().to_string(),
            Tone::Bad => text.bright_red().to_string(),
            Tone::Uk => text.bright_blue().to_string(),
            Tone::Abroad => text.bright_magenta().to_string(),
            Tone::Marker => text.bright_yellow().to_string(),
            Tone::Muted => text.dimmed().to_string(),
            Tone::Heading => text.underline().to_string(),
            Tone::Badge => text.white().on_red().to_string(),
            Tone::Missing => text.magenta().to_string(),
        }
    }
}

/// No styling at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

impl Style for Plain {
    fn paint(&self, _tone: Tone, text: &str) -> String {
        text.to_string()
    }
}

fn side(is_uk: bool) -> &'static str {
    if is_uk {
        "UK"
    } else {
        "NON-UK"
    }
}

/// Days expressed in mean tropical years.
pub fn days_as_years(days: i64) -> f64 {
    Days::new(days as f64).to::<Year>().value()
}

/// Writes the report sections to any [`Write`] sink.
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter<S: Style> {
    style: S,
}

impl<S: Style> ReportFormatter<S> {
    pub fn new(style: S) -> Self {
        Self { style }
    }

    /// All sections in order.
    pub fn write_report<W: Write>(
        &self,
        out: &mut W,
        source: &Path,
        sheet: &FlightSheet,
        log: &FlightLog,
        assessment: &Assessment,
    ) -> io::Result<()> {
        self.write_flights(out, source, sheet)?;
        self.write_cancelled(out, log)?;
        self.write_analysis(out, assessment)?;
        self.write_summary(out, assessment, &sheet.row_errors)?;
        writeln!(out)
    }

    /// Every row read from the file, in file order.
    pub fn write_flights<W: Write>(
        &self,
        out: &mut W,
        source: &Path,
        sheet: &FlightSheet,
    ) -> io::Result<()> {
        let s = &self.style;
        writeln!(out)?;
        writeln!(
            out,
            "{}",
            s.paint(
                Tone::Heading,
                &format!(
                    "READING ENTRIES (FLIGHTS) IN THE CSV FILE, \n{}:",
                    source.display()
                )
            )
        )?;

        let mut number = 0;
        for record in &sheet.records {
            let leg = &record.leg;
            let tag = if record.cancelled {
                s.paint(Tone::Muted, "CANCELd")
            } else {
                number += 1;
                number.to_string()
            };
            let text_or_unknown = |value: &Option<String>| match value {
                Some(text) => text.clone(),
                None => s.paint(Tone::Missing, "unknown"),
            };
            writeln!(
                out,
                "{tag}\tFlight on {} from {} to {} by {} with number {}",
                leg.date,
                s.place(leg.origin_is_uk, &leg.origin),
                s.place(leg.destination_is_uk, &leg.destination),
                text_or_unknown(&record.airline),
                text_or_unknown(&record.flight_number),
            )?;
        }
        writeln!(
            out,
            "Processed {} lines ({} flights + {} cancelled).",
            sheet.records.len(),
            sheet.flight_count(),
            sheet.cancelled_count()
        )
    }

    pub fn write_cancelled<W: Write>(&self, out: &mut W, log: &FlightLog) -> io::Result<()> {
        if log.cancelled().is_empty() {
            return Ok(());
        }
        writeln!(out, "{}", self.style.paint(Tone::Muted, RULE))?;
        writeln!(out, "CANCELLED:")?;
        for (i, record) in log.cancelled().iter().enumerate() {
            let leg = &record.leg;
            writeln!(
                out,
                "{}. \t{}: from {} ({}) to {} ({})",
                i + 1,
                leg.date.short(),
                leg.origin,
                side(leg.origin_is_uk),
                leg.destination,
                side(leg.destination_is_uk)
            )?;
        }
        Ok(())
    }

    /// The walk leg by leg, with window boundaries where they were crossed.
    pub fn write_analysis<W: Write>(&self, out: &mut W, assessment: &Assessment) -> io::Result<()> {
        let s = &self.style;
        let timeline = &assessment.timeline;
        let windows = &assessment.windows;

        writeln!(out, "{}", s.paint(Tone::Muted, RULE))?;
        writeln!(out)?;
        writeln!(out, "{}", s.paint(Tone::Heading, "ANALYSING THE FLIGHTS:"))?;

        for step in &timeline.steps {
            self.write_step(out, assessment, step)?;
        }

        let closing = &timeline.closing;
        self.write_stay(out, assessment, closing, "")?;
        self.write_marker(out, windows.application, "Applying", Tone::Marker)?;
        if let Some(tail) = timeline.month_end_tail {
            self.write_piece(out, closing.presence, tail, "")?;
            self.write_marker(out, windows.application_star, "Applying (*)", Tone::Muted)?;
        }
        Ok(())
    }

    fn write_step<W: Write>(
        &self,
        out: &mut W,
        assessment: &Assessment,
        step: &TimelineStep,
    ) -> io::Result<()> {
        let s = &self.style;
        if step.stay.presence == Presence::Unknown {
            self.write_markers(out, assessment, &step.stay.crossed)?;
            if let Some(error) = assessment
                .timeline
                .errors
                .iter()
                .find(|e| e.index == step.index)
            {
                writeln!(
                    out,
                    "{} {}",
                    s.paint(Tone::Badge, " Error "),
                    s.paint(Tone::Bad, &error.to_string())
                )?;
            }
        } else {
            let note = if step.lead_in { " (before first flight)" } else { "" };
            self.write_stay(out, assessment, &step.stay, note)?;
        }

        let leg = &step.leg;
        writeln!(
            out,
            "\t{} from {} to {} {}",
            leg.date,
            leg.origin,
            leg.destination,
            s.paint(
                Tone::Muted,
                &format!("{}, {}", step.running.five_year, step.running.one_year)
            )
        )
    }

    /// Pieces of a stay, each preceded by the markers of the boundaries it starts on.
    fn write_stay<W: Write>(
        &self,
        out: &mut W,
        assessment: &Assessment,
        stay: &Stay,
        note: &str,
    ) -> io::Result<()> {
        let windows = &assessment.windows;
        let mut pending: Vec<WindowBoundary> = stay.crossed.clone();

        if stay.pieces.is_empty() {
            self.write_markers(out, assessment, &pending)?;
            return self.write_piece(out, stay.presence, Period::at(windows.application), note);
        }

        for piece in &stay.pieces {
            let (due, later): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|b| windows.boundary(*b) <= piece.start);
            self.write_markers(out, assessment, &due)?;
            pending = later;
            self.write_piece(out, stay.presence, *piece, note)?;
        }
        self.write_markers(out, assessment, &pending)
    }

    fn write_piece<W: Write>(
        &self,
        out: &mut W,
        presence: Presence,
        piece: Period,
        note: &str,
    ) -> io::Result<()> {
        let tone = match presence {
            Presence::Uk => Tone::Uk,
            Presence::Abroad => Tone::Abroad,
            Presence::Unknown => Tone::Bad,
        };
        let line = format!(
            "{} \t{} days{note}",
            presence.label(),
            piece.duration_days()
        );
        writeln!(out, "{}", self.style.paint(tone, &line))
    }

    fn write_markers<W: Write>(
        &self,
        out: &mut W,
        assessment: &Assessment,
        boundaries: &[WindowBoundary],
    ) -> io::Result<()> {
        for boundary in boundaries {
            let tone = if boundary.is_star() {
                Tone::Muted
            } else {
                Tone::Marker
            };
            let date = assessment.windows.boundary(*boundary);
            self.write_marker(out, date, boundary.label(), tone)?;
        }
        Ok(())
    }

    fn write_marker<W: Write>(
        &self,
        out: &mut W,
        date: CalendarDate,
        label: &str,
        tone: Tone,
    ) -> io::Result<()> {
        let text = format!("------- {date} {label} --------");
        writeln!(out, "{}", self.style.paint(tone, &text))
    }

    /// Final figures against their caps, day totals and the error list.
    pub fn write_summary<W: Write>(
        &self,
        out: &mut W,
        assessment: &Assessment,
        row_errors: &[RowError],
    ) -> io::Result<()> {
        let s = &self.style;
        let windows = &assessment.windows;
        let limits = &assessment.limits;
        let window_totals = &assessment.timeline.window_totals;
        let totals = &assessment.timeline.totals;

        writeln!(out, "{}", s.paint(Tone::Muted, RULE))?;
        writeln!(
            out,
            "Applying Period:        {} - {}",
            windows.date_5y, windows.application
        )?;
        writeln!(
            out,
            "12-Month Period:        {} - {}",
            windows.date_1y, windows.application
        )?;
        writeln!(out, "{}", s.paint(Tone::Muted, RULE))?;

        self.write_figure(
            out,
            "Total outside UK (12M): ",
            window_totals.one_year,
            limits.twelve_months,
        )?;
        self.write_figure(
            out,
            "Total outside UK (5Y):  ",
            window_totals.five_year,
            limits.five_years,
        )?;
        self.write_figure(
            out,
            "Outside UK (any 12-M):  ",
            assessment.rolling_maximum.days,
            limits.any_twelve_months,
        )?;
        writeln!(
            out,
            "{}",
            s.paint(
                Tone::Muted,
                &format!(
                    "                        busiest window {} - {}",
                    assessment.rolling_maximum.from, assessment.rolling_maximum.to
                )
            )
        )?;

        if !windows.is_month_end() {
            writeln!(
                out,
                "{}",
                s.paint(
                    Tone::Muted,
                    &format!("(*) applying on {} instead:", windows.application_star)
                )
            )?;
            self.write_figure(
                out,
                "Total outside UK (12M*):",
                window_totals.one_year_star,
                limits.twelve_months,
            )?;
            self.write_figure(
                out,
                "Total outside UK (5Y*): ",
                window_totals.five_year_star,
                limits.five_years,
            )?;
        }

        writeln!(out, "{}", s.paint(Tone::Muted, RULE))?;
        self.write_total(out, "Total outside UK:       ", totals.abroad)?;
        self.write_total(out, "Total in UK:            ", totals.uk)?;

        let consistency = &assessment.timeline.errors;
        if !row_errors.is_empty() || !consistency.is_empty() {
            writeln!(out, "{}", s.paint(Tone::Muted, RULE))?;
            self.write_total(out, "Total in ERR:           ", totals.error)?;
            let messages = row_errors
                .iter()
                .map(ToString::to_string)
                .chain(consistency.iter().map(ToString::to_string));
            for (i, message) in messages.enumerate() {
                writeln!(out, "{}. \t{}", i + 1, s.paint(Tone::Bad, &message))?;
            }
        }
        Ok(())
    }

    fn write_figure<W: Write>(
        &self,
        out: &mut W,
        label: &str,
        days: i64,
        cap: i64,
    ) -> io::Result<()> {
        let s = &self.style;
        writeln!(
            out,
            "{label} {}{}",
            s.pass_fail(within(days, cap), &days.to_string()),
            s.paint(
                Tone::Muted,
                &format!("d (Max {cap}d) => {:.1}%", percent_of(days, cap))
            )
        )
    }

    fn write_total<W: Write>(&self, out: &mut W, label: &str, days: i64) -> io::Result<()> {
        writeln!(
            out,
            "{label}{days}{}",
            self.style.paint(
                Tone::Muted,
                &format!("d ({:.1} year)", days_as_years(days))
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::ResidencyLimits;

    fn render(csv: &str, application: CalendarDate) -> String {
        let sheet = FlightSheet::parse(csv);
        let log = FlightLog::from_records(sheet.records.clone()).unwrap();
        let assessment =
            Assessment::compute(&log, application, ResidencyLimits::default()).unwrap();
        let mut out = Vec::new();
        ReportFormatter::new(Plain)
            .write_report(&mut out, Path::new("flights.csv"), &sheet, &log, &assessment)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> CalendarDate {
        CalendarDate::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_plain_style_is_identity() {
        assert_eq!(Plain.paint(Tone::Bad, "x"), "x");
        assert_eq!(Plain.pass_fail(false, "EDI"), "EDI");
    }

    #[test]
    fn test_colored_style_wraps_in_escapes() {
        let good = Colored.pass_fail(true, "EDI");
        let bad = Colored.pass_fail(false, "EDI");
        assert!(good.contains("EDI") && good.starts_with('\u{1b}'));
        assert_ne!(good, bad);
    }

    #[test]
    fn test_days_as_years() {
        assert!((days_as_years(365) - 0.9993).abs() < 1e-3);
        assert_eq!(days_as_years(0), 0.0);
    }

    #[test]
    fn test_report_sections() {
        let text = render(
            "\
17/05/10 10:40,LIS,FALSE,EDI,TRUE,RyanAir,FR1111,FALSE
27/07/10 13:10,EDI,TRUE,GDN,FALSE,RyanAir,FR2222,TRUE
01/03/20,EDI,TRUE,CDG,FALSE
15/03/20,CDG,FALSE,EDI,TRUE,,,FALSE
not a date,EDI,TRUE,CDG,FALSE
",
            date(2020, 10, 10),
        );
        assert!(text.contains("READING ENTRIES (FLIGHTS) IN THE CSV FILE, \nflights.csv:"));
        assert!(text
            .contains("1\tFlight on 17/05/2010 from LIS to EDI by RyanAir with number FR1111"));
        assert!(text.contains("CANCELd\tFlight on 27/07/2010"));
        assert!(text.contains("by unknown with number unknown"));
        assert!(text.contains("Processed 4 lines (3 flights + 1 cancelled)."));
        assert!(text.contains("CANCELLED:\n1. \t27/07/10: from EDI (UK) to GDN (NON-UK)"));
        assert!(text.contains("------- 11/10/2015 5 year --------"));
        assert!(text.contains("------- 11/10/2019 12 month --------"));
        assert!(text.contains("NON-UK \t14 days"));
        assert!(text.contains("------- 10/10/2020 Applying --------"));
        assert!(text.contains("------- 31/10/2020 Applying (*) --------"));
        assert!(text.contains("Total outside UK (12M):  14d (Max 90d) => 15.6%"));
        assert!(text.contains("Total outside UK (5Y):   14d (Max 450d) => 3.1%"));
        assert!(text.contains("Outside UK (any 12-M):   13d (Max 180d) => 7.2%"));
        assert!(text.contains("Total in ERR:           0d"));
        assert!(text.contains("1. \tCSV line 5: flight date \"not a date\" has wrong format"));
    }

    #[test]
    fn test_report_lists_consistency_errors() {
        let text = render(
            "\
01/01/20,LHR,TRUE,CDG,FALSE
10/01/20,LHR,TRUE,DUB,FALSE
10/02/20,DUB,FALSE,LHR,TRUE
",
            date(2020, 10, 31),
        );
        assert!(text.contains(" Error  9d CDG@01/01/20 NON-UK - UK LHR@10/01/20"));
        assert!(text.contains("Total in ERR:           9d"));
        assert!(!text.contains("Applying (*)"));
        assert!(!text.contains("12M*"));
    }
}
