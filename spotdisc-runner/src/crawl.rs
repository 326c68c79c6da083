//! Multi-day crawl sequencing.
//!
//! Drives the daily aggregator across a date range: per-day progress
//! events in order, per-day failures recorded and skipped, successful
//! days stacked in date order into one continuous datetime-indexed table.
//! Day-level aggregation stays all-or-nothing; tolerance exists only at
//! the range level.

use chrono::NaiveDate;
use spotdisc_core::aggregate::{
    self, DayTables, DAY_AHEAD_COLUMNS, REAL_TIME_COLUMNS, TIME_INDEX,
};
use spotdisc_core::prices::{collect_day_prices, LivePrices, PriceSource};
use spotdisc_core::{CrawlContext, FetchError, Region, Table};
use std::collections::BTreeMap;
use thiserror::Error;

/// Severity of a progress/log event. This channel is the only externally
/// observable trace of pipeline execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Consumer of crawl progress. Implementations bridge to stdout, a log
/// panel, or the worker channel; events arrive strictly in execution
/// order, before the final result is returned.
pub trait CrawlProgress: Send {
    fn log(&mut self, level: LogLevel, message: &str);

    /// One node-price fetch finished: running `count` out of `total`
    /// (2 × node count), reset at each day boundary.
    fn price_fetch(&mut self, count: usize, total: usize, message: &str) {
        let _ = (count, total);
        self.log(LogLevel::Info, message);
    }
}

/// Progress reporter that prints to stdout/stderr.
pub struct StdoutProgress;

impl CrawlProgress for StdoutProgress {
    fn log(&mut self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => println!("{message}"),
            LogLevel::Success => println!("OK: {message}"),
            LogLevel::Warning => eprintln!("WARN: {message}"),
            LogLevel::Error => eprintln!("ERROR: {message}"),
        }
    }

    fn price_fetch(&mut self, count: usize, total: usize, message: &str) {
        println!("[{count}/{total}] {message}");
    }
}

/// Local validation failures, rejected before any network call.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("session cookie is empty; paste a CAMSID cookie before crawling")]
    EmptyCookie,

    #[error("end date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("installed thermal capacity must be a positive number (got {0})")]
    InvalidCapacity(f64),

    #[error("the node registry is empty; add at least one node first")]
    EmptyNodeRegistry,
}

/// Final result of a range crawl. `table` holds the successful days'
/// rows stacked in date order; it is empty when no day succeeded, in
/// which case `errors` carries every per-day failure message.
#[derive(Debug, Clone)]
pub struct RangeOutcome {
    pub table: Table,
    /// Hourly west-to-east companion table (day-ahead crawls only).
    pub west_to_east_hourly: Option<Table>,
    pub errors: Vec<String>,
    pub days_succeeded: usize,
    pub days_failed: usize,
}

impl RangeOutcome {
    pub fn any_data(&self) -> bool {
        !self.table.is_empty()
    }
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), CrawlError> {
    if end < start {
        return Err(CrawlError::InvalidRange { start, end });
    }
    Ok(())
}

fn validate_context(ctx: &CrawlContext) -> Result<(), CrawlError> {
    if ctx.cookie().trim().is_empty() {
        return Err(CrawlError::EmptyCookie);
    }
    let cap = ctx.installed_thermal_mw();
    if !cap.is_finite() || cap <= 0.0 {
        return Err(CrawlError::InvalidCapacity(cap));
    }
    Ok(())
}

/// Calendar days from `start` to `end`, both inclusive.
fn days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Crawl day-ahead disclosure data for a date range.
pub fn crawl_disclosure_range(
    ctx: &CrawlContext,
    start: NaiveDate,
    end: NaiveDate,
    region: Region,
    progress: &mut dyn CrawlProgress,
) -> Result<RangeOutcome, CrawlError> {
    validate_context(ctx)?;
    crawl_disclosure_range_with(
        start,
        end,
        |date| aggregate::aggregate_day(ctx, date, region),
        progress,
    )
}

/// Range sequencing with an injectable per-day aggregator. Split out so
/// the sequencing contract is testable without the network.
pub fn crawl_disclosure_range_with<F>(
    start: NaiveDate,
    end: NaiveDate,
    mut aggregate_day: F,
    progress: &mut dyn CrawlProgress,
) -> Result<RangeOutcome, CrawlError>
where
    F: FnMut(NaiveDate) -> Result<DayTables, FetchError>,
{
    validate_range(start, end)?;

    let mut table = Table::new(
        TIME_INDEX,
        DAY_AHEAD_COLUMNS.iter().map(|c| c.to_string()).collect(),
    );
    let mut west_hourly = Table::new(TIME_INDEX, vec!["west_to_east".to_string()]);
    let mut errors = Vec::new();
    let mut days_succeeded = 0;

    for date in days(start, end) {
        match aggregate_day(date) {
            Ok(day) => {
                table.append(day.main);
                west_hourly.append(day.west_to_east_hourly);
                days_succeeded += 1;
                progress.log(LogLevel::Success, &format!("completed {date} disclosure fetch"));
            }
            Err(e) => {
                progress.log(LogLevel::Error, &format!("failed {date} disclosure fetch: {e}"));
                errors.push(format!("{date}: {e}"));
            }
        }
    }

    finish_range(progress, &table, &errors);
    Ok(RangeOutcome {
        table,
        west_to_east_hourly: Some(west_hourly),
        days_failed: errors.len(),
        errors,
        days_succeeded,
    })
}

/// Crawl real-time disclosure data for a date range.
pub fn crawl_realtime_range(
    ctx: &CrawlContext,
    start: NaiveDate,
    end: NaiveDate,
    region: Region,
    progress: &mut dyn CrawlProgress,
) -> Result<RangeOutcome, CrawlError> {
    validate_context(ctx)?;
    crawl_realtime_range_with(
        start,
        end,
        |date| aggregate::aggregate_realtime_day(ctx, date, region),
        progress,
    )
}

/// Real-time range sequencing with an injectable per-day aggregator.
pub fn crawl_realtime_range_with<F>(
    start: NaiveDate,
    end: NaiveDate,
    mut aggregate_day: F,
    progress: &mut dyn CrawlProgress,
) -> Result<RangeOutcome, CrawlError>
where
    F: FnMut(NaiveDate) -> Result<Table, FetchError>,
{
    validate_range(start, end)?;

    let mut table = Table::new(
        TIME_INDEX,
        REAL_TIME_COLUMNS.iter().map(|c| c.to_string()).collect(),
    );
    let mut errors = Vec::new();
    let mut days_succeeded = 0;

    for date in days(start, end) {
        match aggregate_day(date) {
            Ok(day) => {
                table.append(day);
                days_succeeded += 1;
                progress.log(
                    LogLevel::Success,
                    &format!("completed {date} real-time disclosure fetch"),
                );
            }
            Err(e) => {
                progress.log(
                    LogLevel::Error,
                    &format!("failed {date} real-time disclosure fetch: {e}"),
                );
                errors.push(format!("{date}: {e}"));
            }
        }
    }

    finish_range(progress, &table, &errors);
    Ok(RangeOutcome {
        table,
        west_to_east_hourly: None,
        days_failed: errors.len(),
        errors,
        days_succeeded,
    })
}

/// Emit the explicit "no data" signal followed by the joined per-day
/// errors when an entire range came up empty.
fn finish_range(progress: &mut dyn CrawlProgress, table: &Table, errors: &[String]) {
    if table.is_empty() {
        progress.log(LogLevel::Warning, "no data retrieved for the requested range");
        if !errors.is_empty() {
            progress.log(LogLevel::Error, &errors.join("\n"));
        }
    }
}

/// Collect node prices across a date range for every registered node.
pub fn collect_node_prices(
    ctx: &CrawlContext,
    nodes: &BTreeMap<String, String>,
    start: NaiveDate,
    end: NaiveDate,
    region: Region,
    progress: &mut dyn CrawlProgress,
) -> Result<Table, CrawlError> {
    validate_context(ctx)?;
    let source = LivePrices::new(ctx, region);
    collect_node_prices_with(&source, nodes, start, end, progress)
}

/// Price collection with an injectable price source.
pub fn collect_node_prices_with(
    source: &dyn PriceSource,
    nodes: &BTreeMap<String, String>,
    start: NaiveDate,
    end: NaiveDate,
    progress: &mut dyn CrawlProgress,
) -> Result<Table, CrawlError> {
    validate_range(start, end)?;
    if nodes.is_empty() {
        return Err(CrawlError::EmptyNodeRegistry);
    }

    let mut all: Option<Table> = None;
    for date in days(start, end) {
        let (day_table, warnings) = collect_day_prices(source, date, nodes, &mut |e| {
            progress.price_fetch(e.count, e.total, &e.message)
        });
        for w in &warnings {
            progress.log(LogLevel::Warning, w);
        }
        progress.log(
            LogLevel::Success,
            &format!("completed {date} node price collection"),
        );
        match all.as_mut() {
            Some(t) => t.append(day_table),
            None => all = Some(day_table),
        }
    }

    // The validated range has at least one day.
    Ok(all.expect("non-empty date range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotdisc_core::aggregate::{build_day_tables, DaySources};
    use spotdisc_core::Cell;

    /// Progress recorder used across the sequencing tests.
    #[derive(Default)]
    struct Recorder {
        events: Vec<(LogLevel, String)>,
    }

    impl CrawlProgress for Recorder {
        fn log(&mut self, level: LogLevel, message: &str) {
            self.events.push((level, message.to_string()));
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn synthetic_day(d: NaiveDate) -> DayTables {
        let labels = spotdisc_core::TimeGrid::build(spotdisc_core::Granularity::QuarterHour);
        let sources = DaySources {
            dispatched_load: labels.labels().iter().map(|l| (l.clone(), 1000.0)).collect(),
            ..DaySources::default()
        };
        build_day_tables(d, &sources, 17_170.0)
    }

    fn failure(d: NaiveDate) -> FetchError {
        let _ = d;
        FetchError::Envelope {
            endpoint: spotdisc_core::Endpoint::DispatchedLoad,
            detail: "upstream hiccup".into(),
        }
    }

    #[test]
    fn failed_middle_day_is_skipped_and_reported() {
        let mut rec = Recorder::default();
        let bad = date("2025-08-16");
        let outcome = crawl_disclosure_range_with(
            date("2025-08-15"),
            date("2025-08-17"),
            |d| {
                if d == bad {
                    Err(failure(d))
                } else {
                    Ok(synthetic_day(d))
                }
            },
            &mut rec,
        )
        .unwrap();

        assert_eq!(outcome.days_succeeded, 2);
        assert_eq!(outcome.days_failed, 1);
        assert_eq!(outcome.table.row_count(), 2 * 96);
        // Days 1 and 3 only, in date order; day 2 absent entirely.
        assert_eq!(outcome.table.index()[0], "2025-08-15 00:00");
        assert_eq!(outcome.table.index()[96], "2025-08-17 00:00");
        assert!(outcome.table.index().iter().all(|l| !l.starts_with("2025-08-16")));

        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("2025-08-16:"));
        assert!(rec
            .events
            .iter()
            .any(|(lvl, msg)| *lvl == LogLevel::Error && msg.contains("2025-08-16")));
    }

    #[test]
    fn per_day_events_arrive_in_date_order() {
        let mut rec = Recorder::default();
        crawl_disclosure_range_with(
            date("2025-08-15"),
            date("2025-08-17"),
            |d| Ok(synthetic_day(d)),
            &mut rec,
        )
        .unwrap();

        let days: Vec<&str> = rec
            .events
            .iter()
            .filter(|(lvl, _)| *lvl == LogLevel::Success)
            .map(|(_, msg)| &msg[10..20])
            .collect();
        assert_eq!(days, vec!["2025-08-15", "2025-08-16", "2025-08-17"]);
    }

    #[test]
    fn empty_range_result_emits_no_data_then_errors() {
        let mut rec = Recorder::default();
        let outcome = crawl_disclosure_range_with(
            date("2025-08-15"),
            date("2025-08-16"),
            |d| Err(failure(d)),
            &mut rec,
        )
        .unwrap();

        assert!(!outcome.any_data());
        assert_eq!(outcome.days_failed, 2);

        let tail: Vec<&LogLevel> = rec.events.iter().map(|(lvl, _)| lvl).rev().take(2).collect();
        assert_eq!(tail, vec![&LogLevel::Error, &LogLevel::Warning]);
        let (_, joined) = rec.events.last().unwrap();
        assert!(joined.contains("2025-08-15") && joined.contains("2025-08-16"));
    }

    #[test]
    fn reversed_range_is_rejected_before_any_fetch() {
        let mut rec = Recorder::default();
        let mut called = false;
        let result = crawl_disclosure_range_with(
            date("2025-08-17"),
            date("2025-08-15"),
            |d| {
                called = true;
                Ok(synthetic_day(d))
            },
            &mut rec,
        );
        assert!(matches!(result, Err(CrawlError::InvalidRange { .. })));
        assert!(!called);
        assert!(rec.events.is_empty());
    }

    #[test]
    fn empty_node_registry_is_rejected() {
        struct NoPrices;
        impl PriceSource for NoPrices {
            fn day_ahead(
                &self,
                _: &str,
                _: &str,
                _: NaiveDate,
            ) -> Result<spotdisc_core::Series, FetchError> {
                unreachable!("must not fetch with an empty registry")
            }
            fn real_time(
                &self,
                _: &str,
                _: &str,
                _: NaiveDate,
            ) -> Result<spotdisc_core::Series, FetchError> {
                unreachable!("must not fetch with an empty registry")
            }
        }

        let mut rec = Recorder::default();
        let result = collect_node_prices_with(
            &NoPrices,
            &BTreeMap::new(),
            date("2025-08-15"),
            date("2025-08-15"),
            &mut rec,
        );
        assert!(matches!(result, Err(CrawlError::EmptyNodeRegistry)));
    }

    #[test]
    fn multi_day_prices_concatenate_and_reset_counts() {
        struct Flat;
        impl PriceSource for Flat {
            fn day_ahead(
                &self,
                _: &str,
                _: &str,
                _: NaiveDate,
            ) -> Result<spotdisc_core::Series, FetchError> {
                let mut s = spotdisc_core::Series::new();
                s.insert("00:00", 400.0);
                Ok(s)
            }
            fn real_time(
                &self,
                _: &str,
                _: &str,
                _: NaiveDate,
            ) -> Result<spotdisc_core::Series, FetchError> {
                Ok(spotdisc_core::Series::new())
            }
        }

        #[derive(Default)]
        struct CountRecorder {
            counts: Vec<usize>,
        }
        impl CrawlProgress for CountRecorder {
            fn log(&mut self, _: LogLevel, _: &str) {}
            fn price_fetch(&mut self, count: usize, _total: usize, _message: &str) {
                self.counts.push(count);
            }
        }

        let mut nodes = BTreeMap::new();
        nodes.insert("alpha".to_string(), "N1".to_string());

        let mut rec = CountRecorder::default();
        let table = collect_node_prices_with(
            &Flat,
            &nodes,
            date("2025-08-15"),
            date("2025-08-16"),
            &mut rec,
        )
        .unwrap();

        assert_eq!(table.row_count(), 2 * 96);
        assert_eq!(
            table.cell("2025-08-16 00:00", "alpha day_ahead_price"),
            Some(&Cell::Number(400.0))
        );
        // Count resets at the day boundary.
        assert_eq!(rec.counts, vec![1, 2, 1, 2]);
    }
}
