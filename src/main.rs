// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! `ukresidency` command line entry point.

use anyhow::{Context, Result};
use clap::Parser;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use ukresidency::{
    Assessment, CalendarDate, Colored, Error, FlightLog, FlightSheet, Plain, ReportFormatter,
    ResidencyLimits,
};

/// Counts days spent outside the UK ahead of a citizenship or passport application.
#[derive(Parser, Debug)]
#[command(name = "ukresidency", version, about, long_about = None)]
#[command(after_help = "Example:\n  ukresidency 020223\n  ukresidency --input flights.csv 101020")]
struct Cli {
    /// Intended application date, DDMMYY (e.g. 020223 for 2 February 2023)
    #[arg(value_name = "APPLICATION_DATE", value_parser = parse_application_date)]
    application_date: CalendarDate,

    /// Flight CSV; defaults to the first *.csv file in the current directory
    #[arg(short, long, env = "UKRESIDENCY_INPUT")]
    input: Option<PathBuf>,

    /// Disable coloured output (also honoured via NO_COLOR)
    #[arg(long)]
    no_color: bool,

    /// Print the computed figures as JSON instead of the report
    #[arg(long)]
    json: bool,

    /// Show debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Cap on days abroad in the trailing 12 months
    #[arg(long, value_name = "DAYS", default_value_t = ResidencyLimits::default().twelve_months)]
    max_12m: i64,

    /// Cap on days abroad in the trailing 5 years
    #[arg(long, value_name = "DAYS", default_value_t = ResidencyLimits::default().five_years)]
    max_5y: i64,

    /// Cap on days abroad in any 12-month period within the 5 years
    #[arg(
        long,
        value_name = "DAYS",
        default_value_t = ResidencyLimits::default().any_twelve_months
    )]
    max_any_12m: i64,
}

impl Cli {
    fn limits(&self) -> ResidencyLimits {
        ResidencyLimits {
            twelve_months: self.max_12m,
            five_years: self.max_5y,
            any_twelve_months: self.max_any_12m,
        }
    }
}

fn parse_application_date(text: &str) -> std::result::Result<CalendarDate, String> {
    CalendarDate::parse_application(text).map_err(|e| e.to_string())
}

/// First `*.csv` in `dir`, by file name.
fn find_input(dir: &Path) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    candidates.sort();
    match candidates.into_iter().next() {
        Some(path) => Ok(path),
        None => Err(Error::NoInputFile(dir.to_path_buf()).into()),
    }
}

#[cfg(feature = "serde")]
fn write_json<W: Write>(out: &mut W, assessment: &Assessment) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, &assessment.summary())?;
    writeln!(out)?;
    Ok(())
}

#[cfg(not(feature = "serde"))]
fn write_json<W: Write>(_out: &mut W, _assessment: &Assessment) -> Result<()> {
    anyhow::bail!("--json needs the `serde` feature")
}

/// Colour is off with `--no-color` or when `NO_COLOR` is set to anything non-empty.
fn plain_output(no_color: bool, no_color_env: Option<OsString>) -> bool {
    no_color || no_color_env.is_some_and(|value| !value.is_empty())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = match &cli.input {
        Some(path) => path.clone(),
        None => find_input(Path::new("."))?,
    };
    info!(input = %source.display(), application = %cli.application_date, "starting");

    let sheet = FlightSheet::read(&source)?;
    let log = FlightLog::from_records(sheet.records.clone())
        .with_context(|| format!("no usable flights in {}", source.display()))?;
    let assessment = Assessment::compute(&log, cli.application_date, cli.limits())?;
    debug!(intervals = assessment.timeline.intervals.len(), "timeline built");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if cli.json {
        return write_json(&mut out, &assessment);
    }

    if plain_output(cli.no_color, std::env::var_os("NO_COLOR")) {
        ReportFormatter::new(Plain).write_report(&mut out, &source, &sheet, &log, &assessment)?;
    } else {
        ReportFormatter::new(Colored).write_report(&mut out, &source, &sheet, &log, &assessment)?;
    }
    Ok(())
}
