//! End-to-end pipeline test without the network: synthetic day sources →
//! range sequencing → workbook export.

use chrono::NaiveDate;
use spotdisc_core::aggregate::{build_day_tables, DaySources, DayTables};
use spotdisc_core::{Granularity, TimeGrid};
use spotdisc_runner::{crawl_disclosure_range_with, export_workbook, CrawlProgress, LogLevel};

struct Silent;

impl CrawlProgress for Silent {
    fn log(&mut self, _: LogLevel, _: &str) {}
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn synthetic_day(d: NaiveDate) -> DayTables {
    let quarter = TimeGrid::build(Granularity::QuarterHour);
    let hour = TimeGrid::build(Granularity::Hour);
    let sources = DaySources {
        dispatched_load: quarter.labels().iter().map(|l| (l.clone(), 1000.0)).collect(),
        non_market_ex_new_energy: quarter.labels().iter().map(|l| (l.clone(), 200.0)).collect(),
        new_energy_total: quarter.labels().iter().map(|l| (l.clone(), 100.0)).collect(),
        positive_reserve: quarter.labels().iter().map(|l| (l.clone(), 300.0)).collect(),
        negative_reserve: quarter.labels().iter().map(|l| (l.clone(), 250.0)).collect(),
        west_to_east: hour.labels().iter().map(|l| (l.clone(), 50.0)).collect(),
    };
    build_day_tables(d, &sources, 17_170.0)
}

#[test]
fn crawl_then_export_roundtrip() {
    let outcome = crawl_disclosure_range_with(
        date("2025-08-15"),
        date("2025-08-16"),
        |d| Ok(synthetic_day(d)),
        &mut Silent,
    )
    .unwrap();

    assert_eq!(outcome.days_succeeded, 2);
    assert_eq!(outcome.table.row_count(), 192);
    let west = outcome.west_to_east_hourly.as_ref().unwrap();
    assert_eq!(west.row_count(), 48);

    let dir = tempfile::tempdir().unwrap();
    let written = export_workbook(
        dir.path(),
        &[("disclosure", &outcome.table), ("west_to_east", west)],
    )
    .unwrap();
    assert_eq!(written.len(), 2);

    let content = std::fs::read_to_string(&written[0]).unwrap();
    let header = content.lines().next().unwrap();
    assert_eq!(
        header,
        "time,dispatched_load,new_energy_total,non_market_ex_new_energy,\
         positive_reserve,negative_reserve,thermal_bidding_space,load_factor,west_to_east"
    );
    // 192 data rows plus the header.
    assert_eq!(content.lines().count(), 193);
    assert!(content.contains("2025-08-15 00:00,1000,100,200,300,250,650,4.08%,50"));
}

#[test]
fn rerunning_the_same_range_is_byte_identical() {
    let run = || {
        crawl_disclosure_range_with(
            date("2025-08-15"),
            date("2025-08-15"),
            |d| Ok(synthetic_day(d)),
            &mut Silent,
        )
        .unwrap()
    };

    let a = run();
    let b = run();
    assert_eq!(a.table.fingerprint(), b.table.fingerprint());
    assert_eq!(
        a.west_to_east_hourly.unwrap().fingerprint(),
        b.west_to_east_hourly.unwrap().fingerprint()
    );
}
