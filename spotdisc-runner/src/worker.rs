//! Background worker thread — all network crawls run here.
//!
//! The UI thread never blocks: it sends a command, then drains responses
//! from the channel. The worker handles one command at a time, which
//! serializes crawls against the shared credential and its rate limits.
//! A crawl runs to completion or failure; there is no mid-flight
//! cancellation — callers disable their trigger control instead.
//!
//! Each command carries its own cookie and capacity, so every crawl works
//! from a snapshot; changing either value affects only later commands.

use crate::crawl::{self, CrawlProgress, LogLevel, RangeOutcome};
use chrono::NaiveDate;
use spotdisc_core::{CrawlContext, Region, Table};
use std::collections::BTreeMap;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Commands sent from the UI to the worker.
#[derive(Debug, Clone)]
pub enum WorkerCommand {
    CrawlDisclosure {
        cookie: String,
        installed_thermal_mw: f64,
        start: NaiveDate,
        end: NaiveDate,
        region: Region,
    },
    CrawlRealtime {
        cookie: String,
        installed_thermal_mw: f64,
        start: NaiveDate,
        end: NaiveDate,
        region: Region,
    },
    CollectPrices {
        cookie: String,
        installed_thermal_mw: f64,
        start: NaiveDate,
        end: NaiveDate,
        region: Region,
        nodes: BTreeMap<String, String>,
    },
    Shutdown,
}

/// Responses sent from the worker back to the UI. Progress events always
/// precede the terminal event of their command.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    Log {
        level: LogLevel,
        message: String,
    },
    PriceFetch {
        count: usize,
        total: usize,
        message: String,
    },
    DisclosureDone {
        outcome: RangeOutcome,
    },
    RealtimeDone {
        outcome: RangeOutcome,
    },
    PricesDone {
        table: Table,
    },
    /// Command rejected by validation or failed outright.
    CommandFailed {
        message: String,
    },
}

/// Spawn the background worker thread.
pub fn spawn_worker(rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>) -> JoinHandle<()> {
    thread::Builder::new()
        .name("spotdisc-worker".into())
        .spawn(move || worker_loop(rx, tx))
        .expect("failed to spawn worker thread")
}

fn worker_loop(rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>) {
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(cmd) => handle_command(cmd, &tx),
        }
    }
}

fn handle_command(cmd: WorkerCommand, tx: &Sender<WorkerResponse>) {
    let mut progress = ChannelProgress { tx: tx.clone() };

    match cmd {
        WorkerCommand::CrawlDisclosure {
            cookie,
            installed_thermal_mw,
            start,
            end,
            region,
        } => {
            let ctx = CrawlContext::new(cookie, installed_thermal_mw);
            match crawl::crawl_disclosure_range(&ctx, start, end, region, &mut progress) {
                Ok(outcome) => {
                    let _ = tx.send(WorkerResponse::DisclosureDone { outcome });
                }
                Err(e) => {
                    let _ = tx.send(WorkerResponse::CommandFailed { message: e.to_string() });
                }
            }
        }
        WorkerCommand::CrawlRealtime {
            cookie,
            installed_thermal_mw,
            start,
            end,
            region,
        } => {
            let ctx = CrawlContext::new(cookie, installed_thermal_mw);
            match crawl::crawl_realtime_range(&ctx, start, end, region, &mut progress) {
                Ok(outcome) => {
                    let _ = tx.send(WorkerResponse::RealtimeDone { outcome });
                }
                Err(e) => {
                    let _ = tx.send(WorkerResponse::CommandFailed { message: e.to_string() });
                }
            }
        }
        WorkerCommand::CollectPrices {
            cookie,
            installed_thermal_mw,
            start,
            end,
            region,
            nodes,
        } => {
            let ctx = CrawlContext::new(cookie, installed_thermal_mw);
            match crawl::collect_node_prices(&ctx, &nodes, start, end, region, &mut progress) {
                Ok(table) => {
                    let _ = tx.send(WorkerResponse::PricesDone { table });
                }
                Err(e) => {
                    let _ = tx.send(WorkerResponse::CommandFailed { message: e.to_string() });
                }
            }
        }
        WorkerCommand::Shutdown => {} // handled in loop
    }
}

/// CrawlProgress implementation that forwards events through the channel.
struct ChannelProgress {
    tx: Sender<WorkerResponse>,
}

impl CrawlProgress for ChannelProgress {
    fn log(&mut self, level: LogLevel, message: &str) {
        let _ = self.tx.send(WorkerResponse::Log {
            level,
            message: message.to_string(),
        });
    }

    fn price_fetch(&mut self, count: usize, total: usize, message: &str) {
        let _ = self.tx.send(WorkerResponse::PriceFetch {
            count,
            total,
            message: message.to_string(),
        });
    }
}
