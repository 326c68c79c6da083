//! Station trade-result queries.
//!
//! For one registered station (display name → upstream unit id) and one
//! day: the hourly day-ahead and real-time generation-side trade results,
//! merged into a single table, plus the region-level average deal prices.
//!
//! Unlike the bulk disclosure aggregator, every sub-fetch here degrades on
//! failure: the missing half stays empty and a warning is recorded, so a
//! station with only day-ahead results still renders.

use crate::context::CrawlContext;
use crate::endpoints::Region;
use crate::fetch::{self, TradePoint, Timeframe};
use crate::grid::{Granularity, TimeGrid};
use crate::table::{Cell, Table};
use chrono::NaiveDate;

/// Column order of the merged station table.
pub const STATION_COLUMNS: [&str; 4] = [
    "day_ahead_volume",
    "day_ahead_price",
    "real_time_volume",
    "real_time_price",
];

/// Column order of the region averages table.
pub const AREA_COLUMNS: [&str; 4] = [
    "gen_side_day_ahead_avg",
    "user_side_day_ahead_avg",
    "gen_side_real_time_avg",
    "user_side_real_time_avg",
];

/// One station-day query result: merged hourly trade table, all-region
/// average prices, and any degradation warnings.
#[derive(Debug, Clone)]
pub struct StationDayData {
    pub station: Table,
    pub area_averages: Table,
    pub warnings: Vec<String>,
}

fn align_trades(grid: &TimeGrid, points: &[TradePoint]) -> (Vec<Cell>, Vec<Cell>) {
    let volume: Vec<Cell> = grid
        .labels()
        .iter()
        .map(|l| {
            points
                .iter()
                .find(|p| &p.time == l)
                .map(|p| Cell::Number(p.volume))
                .unwrap_or(Cell::Empty)
        })
        .collect();
    let price: Vec<Cell> = grid
        .labels()
        .iter()
        .map(|l| {
            points
                .iter()
                .find(|p| &p.time == l)
                .map(|p| Cell::Number(p.price))
                .unwrap_or(Cell::Empty)
        })
        .collect();
    (volume, price)
}

/// Fetch and merge one station's day-ahead and real-time trade results and
/// the region average prices for the same day.
pub fn collect_station_day(
    ctx: &CrawlContext,
    station_name: &str,
    unit_id: &str,
    date: NaiveDate,
) -> StationDayData {
    let grid = TimeGrid::build(Granularity::Hour);
    let day = date.format("%Y-%m-%d");
    let mut warnings = Vec::new();

    let mut fetch_half = |timeframe: Timeframe| {
        let result = match timeframe {
            Timeframe::DayAhead => fetch::day_ahead_trade_result(ctx, unit_id, date),
            Timeframe::RealTime => fetch::real_time_trade_result(ctx, unit_id, date),
        };
        let label = match timeframe {
            Timeframe::DayAhead => "day-ahead",
            Timeframe::RealTime => "real-time",
        };
        match result {
            Ok(points) if points.is_empty() => {
                warnings.push(format!("{station_name} {day}: {label} trade result is empty"));
                Vec::new()
            }
            Ok(points) => points,
            Err(e) => {
                warnings.push(format!("{station_name} {day}: {label} trade result failed ({e})"));
                Vec::new()
            }
        }
    };

    let day_ahead = fetch_half(Timeframe::DayAhead);
    let real_time = fetch_half(Timeframe::RealTime);

    let (da_volume, da_price) = align_trades(&grid, &day_ahead);
    let (rt_volume, rt_price) = align_trades(&grid, &real_time);

    let station = Table::from_columns(
        crate::aggregate::TIME_INDEX,
        grid.labels().to_vec(),
        STATION_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .zip([da_volume, da_price, rt_volume, rt_price])
            .collect(),
    );

    let area_averages = collect_area_averages(ctx, date, &mut warnings);

    StationDayData {
        station,
        area_averages,
        warnings,
    }
}

/// Average deal prices for every region, day-ahead and real-time, one row
/// per region. Failed regions get empty cells and a warning.
pub fn collect_area_averages(
    ctx: &CrawlContext,
    date: NaiveDate,
    warnings: &mut Vec<String>,
) -> Table {
    let day = date.format("%Y-%m-%d");
    let mut table = Table::new("region", AREA_COLUMNS.iter().map(|c| c.to_string()).collect());

    for region in Region::ALL {
        let mut row = Vec::with_capacity(4);
        for timeframe in [Timeframe::DayAhead, Timeframe::RealTime] {
            match fetch::area_average_price(ctx, region, timeframe, date) {
                Ok(avg) => {
                    row.push(Cell::from_option(avg.generation_side));
                    row.push(Cell::from_option(avg.consumption_side));
                }
                Err(e) => {
                    warnings.push(format!("{day} {region} average price failed ({e})"));
                    row.push(Cell::Empty);
                    row.push(Cell::Empty);
                }
            }
        }
        table.push_row(region.slug(), row);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_trades_reindexes_onto_hour_grid() {
        let grid = TimeGrid::build(Granularity::Hour);
        let points = vec![
            TradePoint {
                time: "01:00".into(),
                volume: 12.5,
                price: 401.2,
            },
            TradePoint {
                time: "13:00".into(),
                volume: 14.0,
                price: 388.0,
            },
        ];
        let (volume, price) = align_trades(&grid, &points);
        assert_eq!(volume.len(), 24);
        assert_eq!(volume[1], Cell::Number(12.5));
        assert_eq!(price[13], Cell::Number(388.0));
        assert_eq!(volume[0], Cell::Empty);
        assert_eq!(price[2], Cell::Empty);
    }
}
