use std::io::Write;
use ukresidency::{
    days_as_years, Assessment, CalendarDate, Error, FlightLog, FlightSheet, Plain, Presence,
    ReportFormatter, ResidencyLimits, WindowDates,
};

fn date(y: i32, m: u32, d: u32) -> CalendarDate {
    CalendarDate::from_ymd(y, m, d).unwrap()
}

fn assess(csv: &str, application: CalendarDate) -> (FlightLog, Assessment) {
    let sheet = FlightSheet::parse(csv);
    let log = FlightLog::from_records(sheet.records).unwrap();
    let assessment = Assessment::compute(&log, application, ResidencyLimits::default()).unwrap();
    (log, assessment)
}

#[test]
fn abroad_for_whole_five_years_counts_every_window_day() {
    let application = CalendarDate::parse_application("101020").unwrap();
    let (_, a) = assess(
        "\
17/05/10 10:40,LIS,FALSE,EDI,TRUE,RyanAir,FR1111,FALSE
27/07/10 13:10,EDI,TRUE,GDN,FALSE,RyanAir,FR2222,FALSE
",
        application,
    );
    let w = a.windows;
    assert_eq!(w.date_5y, date(2015, 10, 11));
    assert_eq!(a.five_years(), w.date_5y.days_until(application));
    assert_eq!(a.twelve_months(), w.date_1y.days_until(application));
    assert_eq!(a.timeline.final_presence(), Presence::Abroad);
    assert!(a.timeline.errors.is_empty());
}

#[test]
fn round_trip_inside_twelve_months() {
    let (_, a) = assess(
        "\
01/01/15,DUB,FALSE,LHR,TRUE
01/03/20 07:15,LHR,TRUE,CDG,FALSE,Air France,AF1081,FALSE
15/03/2020,CDG,FALSE,LHR,TRUE,Air France,AF1080,FALSE
",
        date(2020, 10, 10),
    );
    let trip = date(2020, 3, 1).days_until(date(2020, 3, 15));
    assert_eq!(a.twelve_months(), trip);
    assert_eq!(a.five_years(), trip);
    assert!(a.timeline.errors.is_empty());
    assert!(a.within_limits());
}

#[test]
fn day_buckets_cover_first_flight_to_application() {
    let csv = "\
12/02/12,LHR,TRUE,JFK,FALSE
30/03/12,JFK,FALSE,LHR,TRUE
05/08/14,LHR,TRUE,BCN,FALSE
20/08/14,LHR,TRUE,MAD,FALSE
02/09/14,MAD,FALSE,LHR,TRUE
01/12/17,LHR,TRUE,SYD,FALSE
15/01/18,SYD,FALSE,LHR,TRUE
";
    let application = date(2019, 6, 1);
    let (log, a) = assess(csv, application);
    let totals = a.timeline.totals;
    assert_eq!(
        totals.uk + totals.abroad + totals.error,
        log.first().date.days_until(application)
    );
    assert_eq!(a.timeline.errors.len(), 1);
    assert_eq!(totals.error, 15);
}

#[test]
fn consistency_error_days_never_count_as_abroad() {
    let csv = "\
01/01/20,LHR,TRUE,CDG,FALSE
10/01/20,LHR,TRUE,DUB,FALSE
10/02/20,DUB,FALSE,LHR,TRUE
";
    let (_, a) = assess(csv, date(2020, 10, 10));
    assert_eq!(a.timeline.errors.len(), 1);
    assert_eq!(a.timeline.totals.error, 9);
    assert_eq!(a.twelve_months(), 31);
    assert_eq!(a.timeline.totals.abroad, 31);
}

#[test]
fn cancelled_flights_never_contribute() {
    let with_cancelled = "\
01/01/15,DUB,FALSE,LHR,TRUE
01/03/20,LHR,TRUE,CDG,FALSE
05/03/20,LHR,TRUE,JFK,FALSE,,,TRUE
15/03/20,CDG,FALSE,LHR,TRUE
";
    let without = "\
01/01/15,DUB,FALSE,LHR,TRUE
01/03/20,LHR,TRUE,CDG,FALSE
15/03/20,CDG,FALSE,LHR,TRUE
";
    let (log, a) = assess(with_cancelled, date(2020, 10, 10));
    let (_, b) = assess(without, date(2020, 10, 10));
    assert_eq!(log.cancelled().len(), 1);
    assert!(log.legs().iter().all(|leg| leg.destination != "JFK"));
    assert_eq!(a.summary(), b.summary());
}

#[test]
fn only_cancelled_flight_is_insufficient_data() {
    let sheet = FlightSheet::parse("27/07/10 13:10,EDI,TRUE,GDN,FALSE,RyanAir,FR2222,TRUE\n");
    assert!(matches!(
        FlightLog::from_records(sheet.records),
        Err(Error::InsufficientData { cancelled: 1 })
    ));
}

#[test]
fn unparseable_rows_are_reported_not_fatal() {
    let sheet = FlightSheet::parse(
        "\
DepartDateTime,DepartPlace,IsUK,ArrivePlace,IsUK,Airline,FlNumber,WasCancelled
17/05/10 10:40,LIS,FALSE,EDI,TRUE,RyanAir,FR1111,FALSE
31/02/11,EDI,TRUE,GDN,FALSE
",
    );
    assert_eq!(sheet.row_errors.len(), 2);
    assert_eq!(sheet.records.len(), 1);
    assert!(FlightLog::from_records(sheet.records).is_ok());
}

#[test]
fn month_end_application_has_matching_star_figures() {
    let (_, a) = assess(
        "\
01/01/15,DUB,FALSE,LHR,TRUE
01/03/20,LHR,TRUE,CDG,FALSE
15/03/20,CDG,FALSE,LHR,TRUE
",
        date(2020, 10, 31),
    );
    let totals = a.timeline.window_totals;
    assert!(a.windows.is_month_end());
    assert_eq!(totals.one_year, totals.one_year_star);
    assert_eq!(totals.five_year, totals.five_year_star);
    assert_eq!(a.timeline.month_end_tail, None);
}

#[test]
fn star_figures_include_rest_of_month() {
    let (_, a) = assess(
        "\
01/01/15,DUB,FALSE,LHR,TRUE
01/10/20,LHR,TRUE,CDG,FALSE
",
        date(2020, 10, 10),
    );
    let totals = a.timeline.window_totals;
    assert_eq!(totals.one_year, 9);
    assert_eq!(totals.one_year_star, 30);
}

#[test]
fn window_dates_follow_application_date() {
    let w = WindowDates::new(date(2023, 2, 2)).unwrap();
    assert_eq!(w.date_5y, date(2018, 2, 3));
    assert_eq!(w.date_1y, date(2022, 2, 3));
    assert_eq!(w.application_star, date(2023, 2, 28));
    assert_eq!(w.date_5y_star, date(2018, 3, 1));
}

#[test]
fn report_from_file_on_disk() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(
        file,
        "\
17/05/10 10:40,LIS,FALSE,EDI,TRUE,RyanAir,FR1111,FALSE
27/07/10 13:10,EDI,TRUE,GDN,FALSE,RyanAir,FR2222,TRUE
02/05/11 10:50,WMI,FALSE,PIK,TRUE,RyanAir,FR3333,FALSE
"
    )
    .unwrap();

    let sheet = FlightSheet::read(file.path()).unwrap();
    assert_eq!(sheet.records.len(), 3);
    let log = FlightLog::from_records(sheet.records.clone()).unwrap();
    assert_eq!(log.legs().len(), 2);

    let a = Assessment::compute(&log, date(2020, 10, 10), ResidencyLimits::default()).unwrap();
    assert_eq!(a.timeline.errors.len(), 1);

    let mut out = Vec::new();
    ReportFormatter::new(Plain)
        .write_report(&mut out, file.path(), &sheet, &log, &a)
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Processed 3 lines (2 flights + 1 cancelled)."));
    assert!(text.contains("Total in ERR:"));
}

#[test]
fn booked_flights_after_application_do_not_inflate_totals() {
    let (log, a) = assess(
        "\
01/01/15,DUB,FALSE,LHR,TRUE
01/03/20,LHR,TRUE,CDG,FALSE
15/03/20,CDG,FALSE,LHR,TRUE
01/12/20,LHR,TRUE,JFK,FALSE
",
        date(2020, 10, 10),
    );
    let span = log.first().date.days_until(a.windows.application);
    assert_eq!(a.timeline.totals.total(), span);
    assert_eq!(a.timeline.totals.abroad, 14);
    assert_eq!(a.twelve_months(), 14);

    let mut out = Vec::new();
    ReportFormatter::new(Plain)
        .write_summary(&mut out, &a, &[])
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    let uk = span - 14;
    assert!(text.contains(&format!(
        "Total in UK:            {uk}d ({:.1} year)",
        days_as_years(uk)
    )));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = FlightSheet::read(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[cfg(feature = "serde")]
#[test]
fn summary_json_uses_iso_dates() {
    let (_, a) = assess("01/01/15,DUB,FALSE,LHR,TRUE\n", date(2020, 10, 10));
    let json = serde_json::to_string(&a.summary()).unwrap();
    assert!(json.contains("\"application\":\"2020-10-10\""));
    assert!(json.contains("\"rolling_maximum\""));
}
