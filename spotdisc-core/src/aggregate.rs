//! Daily aggregation — compose the day's fetch adapters into aligned
//! tables and derive the secondary metrics.
//!
//! The adapter set per variant is configuration, not branching: the
//! day-ahead variant fetches load / non-market forecast / new energy /
//! both reserves / west-to-east, the real-time variant fetches load /
//! generation / non-market / new energy / hydro / inter-provincial.
//! If any required adapter fails, the whole day fails — a day is never
//! partially populated.

use crate::context::CrawlContext;
use crate::endpoints::Region;
use crate::error::FetchError;
use crate::fetch::{self, ReserveKind};
use crate::grid::{forward_fill, Granularity, TimeGrid};
use crate::series::Series;
use crate::table::{Cell, Table};
use chrono::NaiveDate;

/// Fixed column order of the day-ahead disclosure table.
pub const DAY_AHEAD_COLUMNS: [&str; 8] = [
    "dispatched_load",
    "new_energy_total",
    "non_market_ex_new_energy",
    "positive_reserve",
    "negative_reserve",
    "thermal_bidding_space",
    "load_factor",
    "west_to_east",
];

/// Fixed column order of the real-time disclosure table.
pub const REAL_TIME_COLUMNS: [&str; 6] = [
    "dispatched_load",
    "generation_total",
    "non_market_total",
    "new_energy",
    "hydro_total",
    "interprovincial",
];

/// Index column name shared by all exported time tables.
pub const TIME_INDEX: &str = "time";

/// Raw series for one day-ahead disclosure day, before alignment.
#[derive(Debug, Clone, Default)]
pub struct DaySources {
    pub dispatched_load: Series,
    pub non_market_ex_new_energy: Series,
    pub new_energy_total: Series,
    pub positive_reserve: Series,
    pub negative_reserve: Series,
    pub west_to_east: Series,
}

/// Raw series for one real-time disclosure day.
#[derive(Debug, Clone, Default)]
pub struct RealTimeSources {
    pub dispatched_load: Series,
    pub generation_total: Series,
    pub non_market_total: Series,
    pub new_energy: Series,
    pub hydro_total: Series,
    pub interprovincial: Series,
}

/// Output of one day-ahead aggregation: the main 15-minute table and the
/// hourly west-to-east companion table.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTables {
    pub main: Table,
    pub west_to_east_hourly: Table,
}

/// `dispatched_load − non_market − new_energy − west_to_east`; missing if
/// any input slot is missing.
pub fn thermal_bidding_space(
    load: Option<f64>,
    non_market: Option<f64>,
    new_energy: Option<f64>,
    west_to_east: Option<f64>,
) -> Option<f64> {
    Some(load? - non_market? - new_energy? - west_to_east?)
}

/// `(thermal_bidding_space + west_to_east) / capacity`, rendered as a
/// percentage with two decimals. Missing inputs yield an empty cell.
pub fn load_factor_cell(
    bidding_space: Option<f64>,
    west_to_east: Option<f64>,
    installed_thermal_mw: f64,
) -> Cell {
    match (bidding_space, west_to_east) {
        (Some(b), Some(w)) => {
            let ratio = (b + w) / installed_thermal_mw;
            Cell::Text(format!("{:.2}%", ratio * 100.0))
        }
        _ => Cell::Empty,
    }
}

/// Align one day's sources onto the 15-minute grid and compute the derived
/// columns. Pure: used directly by the crawler and by tests with synthetic
/// sources.
pub fn build_day_tables(date: NaiveDate, sources: &DaySources, installed_thermal_mw: f64) -> DayTables {
    let grid = TimeGrid::build(Granularity::QuarterHour);

    let load = grid.align(&sources.dispatched_load);
    let new_energy = grid.align(&sources.new_energy_total);
    let non_market = grid.align(&sources.non_market_ex_new_energy);
    let positive = grid.align(&sources.positive_reserve);
    let negative = grid.align(&sources.negative_reserve);

    // The transmission source omits repeated values; carry the last value
    // forward after alignment. This column alone has fill semantics.
    let mut west = grid.align(&sources.west_to_east);
    forward_fill(&mut west);

    let bidding_space: Vec<Option<f64>> = (0..grid.len())
        .map(|i| thermal_bidding_space(load[i], non_market[i], new_energy[i], west[i]))
        .collect();

    let mut main = Table::new(
        TIME_INDEX,
        DAY_AHEAD_COLUMNS.iter().map(|c| c.to_string()).collect(),
    );
    for (i, label) in grid.datetime_labels(date).into_iter().enumerate() {
        main.push_row(
            label,
            vec![
                Cell::from_option(load[i]),
                Cell::from_option(new_energy[i]),
                Cell::from_option(non_market[i]),
                Cell::from_option(positive[i]),
                Cell::from_option(negative[i]),
                Cell::from_option(bidding_space[i]),
                load_factor_cell(bidding_space[i], west[i], installed_thermal_mw),
                Cell::from_option(west[i]),
            ],
        );
    }

    // Companion table: the raw transmission series on the hourly grid,
    // without the forward fill.
    let hour_grid = TimeGrid::build(Granularity::Hour);
    let west_hourly = hour_grid.align(&sources.west_to_east);
    let west_to_east_hourly = Table::from_columns(
        TIME_INDEX,
        hour_grid.datetime_labels(date),
        vec![(
            "west_to_east".to_string(),
            west_hourly.into_iter().map(Cell::from_option).collect(),
        )],
    );

    DayTables {
        main,
        west_to_east_hourly,
    }
}

/// Align one real-time day onto the 15-minute grid. No derived columns.
pub fn build_realtime_table(date: NaiveDate, sources: &RealTimeSources) -> Table {
    let grid = TimeGrid::build(Granularity::QuarterHour);
    let columns = [
        &sources.dispatched_load,
        &sources.generation_total,
        &sources.non_market_total,
        &sources.new_energy,
        &sources.hydro_total,
        &sources.interprovincial,
    ];

    Table::from_columns(
        TIME_INDEX,
        grid.datetime_labels(date),
        REAL_TIME_COLUMNS
            .iter()
            .zip(columns)
            .map(|(name, series)| {
                (
                    name.to_string(),
                    grid.align(series).into_iter().map(Cell::from_option).collect(),
                )
            })
            .collect(),
    )
}

/// Fetch and aggregate one day-ahead disclosure day. All-or-nothing: the
/// first adapter failure aborts the day.
pub fn aggregate_day(
    ctx: &CrawlContext,
    date: NaiveDate,
    region: Region,
) -> Result<DayTables, FetchError> {
    let sources = DaySources {
        dispatched_load: fetch::dispatched_load(ctx, region, date)?,
        non_market_ex_new_energy: fetch::non_market_ex_new_energy_forecast(ctx, region, date)?,
        new_energy_total: fetch::new_energy_day_total(ctx, region, date)?,
        positive_reserve: fetch::reserve(ctx, region, date, ReserveKind::Positive)?,
        negative_reserve: fetch::reserve(ctx, region, date, ReserveKind::Negative)?,
        west_to_east: fetch::west_to_east(ctx, region, date)?,
    };
    Ok(build_day_tables(date, &sources, ctx.installed_thermal_mw()))
}

/// Fetch and aggregate one real-time disclosure day. All-or-nothing.
pub fn aggregate_realtime_day(
    ctx: &CrawlContext,
    date: NaiveDate,
    region: Region,
) -> Result<Table, FetchError> {
    let sources = RealTimeSources {
        dispatched_load: fetch::dispatched_load_real_time(ctx, region, date)?,
        generation_total: fetch::generation_total(ctx, region, date)?,
        non_market_total: fetch::non_market_total(ctx, region, date)?,
        new_energy: fetch::new_energy_output(ctx, region, date)?,
        hydro_total: fetch::hydro_total(ctx, region, date)?,
        interprovincial: fetch::inter_provincial(ctx, date)?,
    };
    Ok(build_realtime_table(date, &sources))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 15).unwrap()
    }

    fn constant_series(labels: &[String], value: f64) -> Series {
        labels.iter().map(|l| (l.clone(), value)).collect()
    }

    fn full_sources() -> DaySources {
        let quarter = TimeGrid::build(Granularity::QuarterHour);
        let hour = TimeGrid::build(Granularity::Hour);
        DaySources {
            dispatched_load: constant_series(quarter.labels(), 1000.0),
            non_market_ex_new_energy: constant_series(quarter.labels(), 200.0),
            new_energy_total: constant_series(quarter.labels(), 100.0),
            positive_reserve: constant_series(quarter.labels(), 300.0),
            negative_reserve: constant_series(quarter.labels(), 250.0),
            // Hourly source: only every fourth 15-minute slot has a value.
            west_to_east: constant_series(hour.labels(), 50.0),
        }
    }

    #[test]
    fn thermal_bidding_space_formula() {
        assert_eq!(
            thermal_bidding_space(Some(1000.0), Some(200.0), Some(100.0), Some(50.0)),
            Some(650.0)
        );
        assert_eq!(thermal_bidding_space(Some(1000.0), None, Some(100.0), Some(50.0)), None);
    }

    #[test]
    fn load_factor_formats_two_decimal_percentage() {
        assert_eq!(
            load_factor_cell(Some(650.0), Some(50.0), 17_170.0),
            Cell::Text("4.08%".into())
        );
        assert_eq!(load_factor_cell(None, Some(50.0), 17_170.0), Cell::Empty);
        assert_eq!(load_factor_cell(Some(650.0), None, 17_170.0), Cell::Empty);
    }

    #[test]
    fn day_table_shape_and_derivations() {
        let tables = build_day_tables(date(), &full_sources(), 17_170.0);

        assert_eq!(tables.main.row_count(), 96);
        assert_eq!(tables.main.columns(), &DAY_AHEAD_COLUMNS);
        assert_eq!(tables.main.index()[0], "2025-08-15 00:00");
        assert_eq!(tables.main.index()[95], "2025-08-15 23:45");

        // Hourly w2e is forward-filled into the quarter-hour slots.
        assert_eq!(
            tables.main.cell("2025-08-15 12:15", "west_to_east"),
            Some(&Cell::Number(50.0))
        );
        assert_eq!(
            tables.main.cell("2025-08-15 12:15", "thermal_bidding_space"),
            Some(&Cell::Number(650.0))
        );
        assert_eq!(
            tables.main.cell("2025-08-15 12:15", "load_factor"),
            Some(&Cell::Text("4.08%".into()))
        );

        assert_eq!(tables.west_to_east_hourly.row_count(), 24);
        assert_eq!(
            tables.west_to_east_hourly.cell("2025-08-15 23:00", "west_to_east"),
            Some(&Cell::Number(50.0))
        );
    }

    #[test]
    fn missing_slots_stay_empty_except_forward_filled_transmission() {
        let mut sources = full_sources();
        sources.dispatched_load = Series::new();
        let tables = build_day_tables(date(), &sources, 17_170.0);

        assert_eq!(tables.main.cell("2025-08-15 00:00", "dispatched_load"), Some(&Cell::Empty));
        assert_eq!(
            tables.main.cell("2025-08-15 00:00", "thermal_bidding_space"),
            Some(&Cell::Empty)
        );
        assert_eq!(tables.main.cell("2025-08-15 00:00", "load_factor"), Some(&Cell::Empty));
        // Transmission still forward-filled regardless of other columns.
        assert_eq!(
            tables.main.cell("2025-08-15 00:45", "west_to_east"),
            Some(&Cell::Number(50.0))
        );
    }

    #[test]
    fn realtime_table_shape() {
        let quarter = TimeGrid::build(Granularity::QuarterHour);
        let sources = RealTimeSources {
            dispatched_load: constant_series(quarter.labels(), 900.0),
            generation_total: constant_series(quarter.labels(), 880.0),
            non_market_total: constant_series(quarter.labels(), 150.0),
            new_energy: constant_series(quarter.labels(), 120.0),
            hydro_total: constant_series(quarter.labels(), 60.0),
            interprovincial: Series::new(),
        };
        let table = build_realtime_table(date(), &sources);
        assert_eq!(table.row_count(), 96);
        assert_eq!(table.columns(), &REAL_TIME_COLUMNS);
        // No fill on the inter-provincial column in the real-time variant.
        assert_eq!(table.cell("2025-08-15 10:00", "interprovincial"), Some(&Cell::Empty));
    }

    #[test]
    fn aggregation_is_deterministic() {
        let sources = full_sources();
        let a = build_day_tables(date(), &sources, 17_170.0);
        let b = build_day_tables(date(), &sources, 17_170.0);
        assert_eq!(a.main.fingerprint(), b.main.fingerprint());
        assert_eq!(
            a.west_to_east_hourly.fingerprint(),
            b.west_to_east_hourly.fingerprint()
        );
    }
}
