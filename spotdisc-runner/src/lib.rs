//! spotdisc Runner — crawl orchestration on top of `spotdisc-core`.
//!
//! This crate provides:
//! - Input validation rejected before any network call
//! - Multi-day sequencing with per-day progress events and partial-failure
//!   tolerance (a failed day is recorded and skipped; a failed adapter
//!   fails only its day)
//! - The single background worker thread and its channel protocol
//! - Workbook export (a directory of named CSV sheets)

pub mod crawl;
pub mod export;
pub mod worker;

pub use crawl::{
    collect_node_prices, collect_node_prices_with, crawl_disclosure_range,
    crawl_disclosure_range_with, crawl_realtime_range, crawl_realtime_range_with, CrawlError,
    CrawlProgress, LogLevel, RangeOutcome, StdoutProgress,
};
pub use export::export_workbook;
pub use worker::{spawn_worker, WorkerCommand, WorkerResponse};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}

    #[test]
    fn channel_types_are_send() {
        assert_send::<WorkerCommand>();
        assert_send::<WorkerResponse>();
        assert_send::<RangeOutcome>();
    }
}
