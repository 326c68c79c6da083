//! spotdisc Core — disclosure-data acquisition and alignment pipeline.
//!
//! This crate contains the non-UI heart of the crawler:
//! - Endpoint registry and region codes for the upstream spot-market API
//! - Per-endpoint fetch adapters with typed response envelopes
//! - Canonical intraday time grids (15-minute / hourly) and strict alignment
//! - Label-indexed tables with an explicit missing-value marker
//! - Daily aggregation with derived columns (thermal bidding space, load factor)
//! - Node-price batch collection and station trade-result queries
//! - Flat JSON registries for user-managed node/station lists

pub mod aggregate;
pub mod context;
pub mod endpoints;
pub mod error;
pub mod fetch;
pub mod grid;
pub mod prices;
pub mod series;
pub mod station;
pub mod store;
pub mod table;

pub use aggregate::{aggregate_day, aggregate_realtime_day, DayTables};
pub use context::CrawlContext;
pub use endpoints::{Endpoint, Region};
pub use error::{FetchError, StoreError};
pub use grid::{Granularity, TimeGrid};
pub use series::Series;
pub use store::RegistryStore;
pub use table::{Cell, Table};
