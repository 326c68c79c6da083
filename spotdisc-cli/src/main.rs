//! spotdisc CLI — crawl disclosure data and manage node/station registries.
//!
//! Commands:
//! - `disclosure` — day-ahead disclosure crawl over a date range
//! - `realtime` — real-time disclosure crawl over a date range
//! - `prices` — node price batch collection for every registered node
//! - `station` — one station's trade results and region average prices
//! - `nodes` / `stations` — manage the persisted registries
//!
//! Crawl commands run on the background worker thread and stream progress
//! to stdout; the CLI thread only drains the response channel.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::mpsc;

use spotdisc_core::context::DEFAULT_INSTALLED_THERMAL_MW;
use spotdisc_core::station::collect_station_day;
use spotdisc_core::{CrawlContext, Region, RegistryStore, Table};
use spotdisc_runner::{
    export_workbook, spawn_worker, LogLevel, RangeOutcome, WorkerCommand, WorkerResponse,
};

#[derive(Parser)]
#[command(name = "spotdisc", about = "spotdisc CLI — electricity-market disclosure crawler")]
struct Cli {
    /// CAMSID session cookie for the upstream service.
    #[arg(long, env = "SPOTDISC_COOKIE", default_value = "", global = true)]
    cookie: String,

    /// Installed thermal capacity (MW), used by the load-factor column.
    #[arg(long, default_value_t = DEFAULT_INSTALLED_THERMAL_MW, global = true)]
    capacity: f64,

    /// Registry directory. Defaults to the platform config dir.
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RangeArgs {
    /// Start date (YYYY-MM-DD).
    #[arg(long)]
    start: String,

    /// End date (YYYY-MM-DD). Defaults to the start date.
    #[arg(long)]
    end: Option<String>,

    /// Market region.
    #[arg(long, default_value = "guizhou")]
    region: Region,

    /// Workbook output directory. Skips export when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl day-ahead disclosure data over a date range.
    Disclosure(RangeArgs),
    /// Crawl real-time disclosure data over a date range.
    Realtime(RangeArgs),
    /// Collect day-ahead and real-time node prices for every registered node.
    Prices(RangeArgs),
    /// Fetch one station's trade results and the region average prices.
    Station {
        /// Station display name, as registered with `stations add`.
        #[arg(long)]
        name: String,

        /// Trading day (YYYY-MM-DD).
        #[arg(long)]
        date: String,

        /// Workbook output directory. Skips export when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Manage the node registry used by `prices`.
    Nodes {
        #[command(subcommand)]
        action: RegistryAction,
    },
    /// Manage the station registry used by `station`.
    Stations {
        #[command(subcommand)]
        action: RegistryAction,
    },
}

#[derive(Subcommand)]
enum RegistryAction {
    /// Add or replace an entry.
    Add { name: String, id: String },
    /// Remove an entry.
    Remove { name: String },
    /// List all entries.
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_dir = cli.config_dir.clone();

    match cli.command {
        Commands::Disclosure(ref args) => run_crawl(&cli, args, CrawlKind::Disclosure),
        Commands::Realtime(ref args) => run_crawl(&cli, args, CrawlKind::Realtime),
        Commands::Prices(ref args) => run_crawl(&cli, args, CrawlKind::Prices),
        Commands::Station {
            ref name,
            ref date,
            ref out,
        } => run_station(&cli, name, date, out.as_deref()),
        Commands::Nodes { action } => {
            run_registry(RegistryStore::nodes(config_dir.as_deref()), action)
        }
        Commands::Stations { action } => {
            run_registry(RegistryStore::stations(config_dir.as_deref()), action)
        }
    }
}

#[derive(Clone, Copy)]
enum CrawlKind {
    Disclosure,
    Realtime,
    Prices,
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn run_crawl(cli: &Cli, args: &RangeArgs, kind: CrawlKind) -> Result<()> {
    let start = parse_date(&args.start)?;
    let end = match &args.end {
        Some(s) => parse_date(s)?,
        None => start,
    };

    let command = match kind {
        CrawlKind::Disclosure => WorkerCommand::CrawlDisclosure {
            cookie: cli.cookie.clone(),
            installed_thermal_mw: cli.capacity,
            start,
            end,
            region: args.region,
        },
        CrawlKind::Realtime => WorkerCommand::CrawlRealtime {
            cookie: cli.cookie.clone(),
            installed_thermal_mw: cli.capacity,
            start,
            end,
            region: args.region,
        },
        CrawlKind::Prices => {
            let nodes = RegistryStore::nodes(cli.config_dir.as_deref());
            WorkerCommand::CollectPrices {
                cookie: cli.cookie.clone(),
                installed_thermal_mw: cli.capacity,
                start,
                end,
                region: args.region,
                nodes: nodes.all().clone(),
            }
        }
    };

    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let handle = spawn_worker(cmd_rx, resp_tx);

    cmd_tx
        .send(command)
        .expect("worker exited before accepting the command");
    cmd_tx
        .send(WorkerCommand::Shutdown)
        .expect("worker exited before shutdown");

    let mut result: Option<Result<Vec<(String, Table)>>> = None;
    for response in resp_rx {
        match response {
            WorkerResponse::Log { level, message } => print_log(level, &message),
            WorkerResponse::PriceFetch { count, total, message } => {
                println!("[{count}/{total}] {message}");
            }
            WorkerResponse::DisclosureDone { outcome } => {
                result = Some(Ok(disclosure_sheets(outcome)));
            }
            WorkerResponse::RealtimeDone { outcome } => {
                result = Some(Ok(vec![("realtime_disclosure".into(), outcome.table)]));
            }
            WorkerResponse::PricesDone { table } => {
                result = Some(Ok(vec![("node_prices".into(), table)]));
            }
            WorkerResponse::CommandFailed { message } => {
                result = Some(Err(anyhow::anyhow!(message)));
            }
        }
    }
    handle.join().expect("worker should join cleanly");

    let sheets = match result {
        Some(Ok(sheets)) => sheets,
        Some(Err(e)) => return Err(e),
        None => bail!("worker exited without a result"),
    };

    if let Some(dir) = &args.out {
        let refs: Vec<(&str, &Table)> = sheets.iter().map(|(n, t)| (n.as_str(), t)).collect();
        let written = export_workbook(dir, &refs)?;
        for path in written {
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn disclosure_sheets(outcome: RangeOutcome) -> Vec<(String, Table)> {
    let mut sheets = vec![("disclosure".to_string(), outcome.table)];
    if let Some(west) = outcome.west_to_east_hourly {
        sheets.push(("west_to_east_hourly".to_string(), west));
    }
    sheets
}

fn run_station(cli: &Cli, name: &str, date: &str, out: Option<&std::path::Path>) -> Result<()> {
    let date = parse_date(date)?;
    if cli.cookie.trim().is_empty() {
        bail!("session cookie is empty; pass --cookie or set SPOTDISC_COOKIE");
    }

    let stations = RegistryStore::stations(cli.config_dir.as_deref());
    let Some(unit_id) = stations.get(name) else {
        bail!("station '{name}' is not registered (see `spotdisc stations add`)");
    };

    let ctx = CrawlContext::new(cli.cookie.clone(), cli.capacity);
    let data = collect_station_day(&ctx, name, unit_id, date);

    for warning in &data.warnings {
        print_log(LogLevel::Warning, warning);
    }
    println!(
        "{name} {date}: {} hourly rows, {} region average rows",
        data.station.row_count(),
        data.area_averages.row_count()
    );

    if let Some(dir) = out {
        let written = export_workbook(
            dir,
            &[("station_data", &data.station), ("area_averages", &data.area_averages)],
        )?;
        for path in written {
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn run_registry(mut store: RegistryStore, action: RegistryAction) -> Result<()> {
    match action {
        RegistryAction::Add { name, id } => {
            store.set(name.clone(), id)?;
            println!("added '{name}' ({})", store.path().display());
        }
        RegistryAction::Remove { name } => {
            if store.remove(&name)? {
                println!("removed '{name}'");
            } else {
                bail!("'{name}' is not registered");
            }
        }
        RegistryAction::List => {
            if store.is_empty() {
                println!("(empty registry at {})", store.path().display());
            }
            for (name, id) in store.all() {
                println!("{name}\t{id}");
            }
        }
    }
    Ok(())
}

fn print_log(level: LogLevel, message: &str) {
    match level {
        LogLevel::Info => println!("{message}"),
        LogLevel::Success => println!("OK: {message}"),
        LogLevel::Warning => eprintln!("WARN: {message}"),
        LogLevel::Error => eprintln!("ERROR: {message}"),
    }
}
