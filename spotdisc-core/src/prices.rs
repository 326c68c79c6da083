//! Node-price batch collection for one day.
//!
//! For every registered node: day-ahead price, then real-time price — two
//! sequential calls per node, each paced by the adapter's fixed delay.
//! A failed node fetch degrades to an empty series (the failure is
//! reported, never raised), leaving that node-day's cells empty.

use crate::context::CrawlContext;
use crate::endpoints::Region;
use crate::error::FetchError;
use crate::grid::{Granularity, TimeGrid};
use crate::series::Series;
use crate::table::{Cell, Table};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Source of per-node price series. The live implementation calls the
/// upstream adapters; tests substitute canned series.
pub trait PriceSource {
    fn day_ahead(&self, node_name: &str, node_id: &str, date: NaiveDate)
        -> Result<Series, FetchError>;
    fn real_time(&self, node_name: &str, node_id: &str, date: NaiveDate)
        -> Result<Series, FetchError>;
}

/// Live price source backed by the upstream node-price endpoints.
pub struct LivePrices<'a> {
    ctx: &'a CrawlContext,
    region: Region,
}

impl<'a> LivePrices<'a> {
    pub fn new(ctx: &'a CrawlContext, region: Region) -> Self {
        Self { ctx, region }
    }
}

impl PriceSource for LivePrices<'_> {
    fn day_ahead(
        &self,
        node_name: &str,
        node_id: &str,
        date: NaiveDate,
    ) -> Result<Series, FetchError> {
        crate::fetch::day_ahead_node_price(self.ctx, self.region, node_name, node_id, date)
    }

    fn real_time(
        &self,
        _node_name: &str,
        node_id: &str,
        date: NaiveDate,
    ) -> Result<Series, FetchError> {
        crate::fetch::real_time_node_price(self.ctx, self.region, node_id, date)
    }
}

/// One progress tick of a day's price collection: running fetch count out
/// of `2 × node_count`, reset at each day boundary.
#[derive(Debug, Clone)]
pub struct PriceFetchEvent {
    pub count: usize,
    pub total: usize,
    pub message: String,
}

/// Price table column name for one node and timeframe.
pub fn price_column(node_name: &str, timeframe: crate::fetch::Timeframe) -> String {
    match timeframe {
        crate::fetch::Timeframe::DayAhead => format!("{node_name} day_ahead_price"),
        crate::fetch::Timeframe::RealTime => format!("{node_name} real_time_price"),
    }
}

/// Collect day-ahead and real-time prices for every registered node for
/// one day, onto the 15-minute grid with full-datetime row labels.
///
/// Returns the day's table plus the degradation warnings (one per failed
/// fetch). `on_fetch` fires after every individual fetch.
pub fn collect_day_prices(
    source: &dyn PriceSource,
    date: NaiveDate,
    nodes: &BTreeMap<String, String>,
    on_fetch: &mut dyn FnMut(PriceFetchEvent),
) -> (Table, Vec<String>) {
    let grid = TimeGrid::build(Granularity::QuarterHour);
    let total = 2 * nodes.len();
    let mut count = 0usize;
    let mut warnings = Vec::new();
    let mut columns: Vec<(String, Vec<Cell>)> = Vec::with_capacity(total);

    let day = date.format("%Y-%m-%d");
    for (name, id) in nodes {
        for timeframe in [crate::fetch::Timeframe::DayAhead, crate::fetch::Timeframe::RealTime] {
            let result = match timeframe {
                crate::fetch::Timeframe::DayAhead => source.day_ahead(name, id, date),
                crate::fetch::Timeframe::RealTime => source.real_time(name, id, date),
            };
            let column = price_column(name, timeframe);
            let series = match result {
                Ok(s) => s,
                Err(e) => {
                    warnings.push(format!("{day} {column}: {e}"));
                    Series::new()
                }
            };
            columns.push((
                column.clone(),
                grid.align(&series).into_iter().map(Cell::from_option).collect(),
            ));
            count += 1;
            on_fetch(PriceFetchEvent {
                count,
                total,
                message: format!("fetched {column} ({count}/{total})"),
            });
        }
    }

    let table = Table::from_columns(
        crate::aggregate::TIME_INDEX,
        grid.datetime_labels(date),
        columns,
    );
    (table, warnings)
}
