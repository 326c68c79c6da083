//! Per-endpoint fetch adapters.
//!
//! Each adapter owns its request payload, its response envelope structs,
//! and its unwrap path — the upstream API is not uniform, and the date
//! format (`YYYYMMDD` vs `YYYY-MM-DD`) and area-field name (`exchange` vs
//! `areaCode` vs `areaNo` vs `sectionId`) vary per endpoint and must be
//! preserved exactly.
//!
//! Failure contract: bulk disclosure adapters return `Err` and fail the
//! whole day. Node-price adapters are called from the batch collector,
//! which degrades a failure to an empty series so one bad node does not
//! abort a multi-node crawl; those adapters also pace themselves with a
//! fixed post-call delay and must only ever be called sequentially.

use crate::context::CrawlContext;
use crate::endpoints::{Endpoint, Region};
use crate::error::FetchError;
use crate::series::Series;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::time::Duration;

/// Fixed pause after each node-price call, to respect the upstream rate
/// limit. Blocking pause on the calling thread, not a global limiter.
pub const PRICE_CALL_DELAY: Duration = Duration::from_secs(2);

/// Display name of the provincial export channel used by the real-time
/// inter-provincial adapter (upstream wire constant).
pub const EXPORT_CHANNEL_NAME: &str = "贵州总送出";

/// Reserve direction, discriminated by the `positiveType` payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveKind {
    Positive,
    Negative,
}

impl ReserveKind {
    fn wire_value(self) -> &'static str {
        match self {
            ReserveKind::Positive => "1",
            ReserveKind::Negative => "2",
        }
    }
}

/// Settlement timeframe for the area average-price query, discriminated by
/// the `dateId` payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    DayAhead,
    RealTime,
}

impl Timeframe {
    fn date_id(self) -> &'static str {
        match self {
            Timeframe::DayAhead => "0",
            Timeframe::RealTime => "1",
        }
    }
}

/// `YYYYMMDD`, used by the bulk disclosure endpoints (`runTime`).
fn compact(date: chrono::NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// `YYYY-MM-DD`, used by the price and trade-result endpoints
/// (`operatingDate` / `operateDate`).
fn dashed(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ─── Envelope plumbing ──────────────────────────────────────────────

/// The common `{"data": {"data": ...}}` envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: DataBody<T>,
}

#[derive(Debug, Deserialize)]
struct DataBody<T> {
    data: T,
}

/// Some endpoints wrap the point list one level deeper:
/// `data.data.list[0].<points>`.
#[derive(Debug, Deserialize)]
struct ListBody<T> {
    list: Vec<T>,
}

/// Accept a numeric value that the upstream may encode as a JSON number
/// or as a string.
fn de_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
    }
    match NumOrStr::deserialize(d)? {
        NumOrStr::Num(x) => Ok(x),
        NumOrStr::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("non-numeric value '{s}'"))),
    }
}

/// Like [`de_f64`] but tolerating `null`/absent values.
fn de_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeNum {
        Num(f64),
        Str(String),
    }
    match Option::<MaybeNum>::deserialize(d)? {
        None => Ok(None),
        Some(MaybeNum::Num(x)) => Ok(Some(x)),
        Some(MaybeNum::Str(s)) => Ok(s.trim().parse::<f64>().ok()),
    }
}

fn post<T: DeserializeOwned>(
    ctx: &CrawlContext,
    endpoint: Endpoint,
    body: serde_json::Value,
) -> Result<T, FetchError> {
    let resp = ctx.post_json(endpoint, &body)?;
    resp.json().map_err(|e| FetchError::Envelope {
        endpoint,
        detail: e.to_string(),
    })
}

fn envelope_err(endpoint: Endpoint, detail: impl Into<String>) -> FetchError {
    FetchError::Envelope {
        endpoint,
        detail: detail.into(),
    }
}

// ─── Day-ahead disclosure adapters (bulk: failure fails the day) ────

#[derive(Debug, Deserialize)]
struct TimeEnergy {
    time: String,
    #[serde(deserialize_with = "de_f64")]
    energy: f64,
}

#[derive(Debug, Deserialize)]
struct TimeTEnergy {
    time: String,
    #[serde(rename = "tEnergy", deserialize_with = "de_f64")]
    t_energy: f64,
}

#[derive(Debug, Deserialize)]
struct TimeValue {
    time: String,
    #[serde(deserialize_with = "de_f64")]
    value: f64,
}

/// Total dispatched load for one day (day-ahead disclosure).
pub fn dispatched_load(
    ctx: &CrawlContext,
    region: Region,
    date: chrono::NaiveDate,
) -> Result<Series, FetchError> {
    let body = json!({ "exchange": region.code(), "runTime": compact(date) });
    let env: Envelope<Vec<TimeEnergy>> = post(ctx, Endpoint::DispatchedLoad, body)?;
    Ok(env.data.data.into_iter().map(|p| (p.time, p.energy)).collect())
}

/// Non-market unit output excluding new energy, forecast.
pub fn non_market_ex_new_energy_forecast(
    ctx: &CrawlContext,
    region: Region,
    date: chrono::NaiveDate,
) -> Result<Series, FetchError> {
    let body = json!({ "areaCode": region.code(), "runTime": compact(date) });
    let env: Envelope<Vec<TimeTEnergy>> =
        post(ctx, Endpoint::NonMarketExNewEnergyForecast, body)?;
    Ok(env.data.data.into_iter().map(|p| (p.time, p.t_energy)).collect())
}

#[derive(Debug, Deserialize)]
struct NewEnergyPoint {
    time: String,
    #[serde(rename = "energy01", deserialize_with = "de_f64")]
    energy: f64,
}

/// New-energy total output for one day.
pub fn new_energy_day_total(
    ctx: &CrawlContext,
    region: Region,
    date: chrono::NaiveDate,
) -> Result<Series, FetchError> {
    let body = json!({
        "exchange": region.code(),
        "runTime": compact(date),
        "dayType": "2",
        "dataType": "1",
    });
    let env: Envelope<Vec<NewEnergyPoint>> = post(ctx, Endpoint::NewEnergyDayTotal, body)?;
    Ok(env.data.data.into_iter().map(|p| (p.time, p.energy)).collect())
}

#[derive(Debug, Deserialize)]
struct ReserveEntry {
    #[serde(rename = "lmplist")]
    points: Vec<TimeValue>,
}

/// Positive or negative reserve capacity. One endpoint serves both,
/// discriminated by `positiveType`.
pub fn reserve(
    ctx: &CrawlContext,
    region: Region,
    date: chrono::NaiveDate,
    kind: ReserveKind,
) -> Result<Series, FetchError> {
    let body = json!({
        "exchange": region.code(),
        "runTime": compact(date),
        "positiveType": kind.wire_value(),
    });
    let env: Envelope<ListBody<ReserveEntry>> = post(ctx, Endpoint::Reserve, body)?;
    let entry = env
        .data
        .data
        .list
        .into_iter()
        .next()
        .ok_or_else(|| envelope_err(Endpoint::Reserve, "empty reserve list"))?;
    Ok(entry.points.into_iter().map(|p| (p.time, p.value)).collect())
}

#[derive(Debug, Deserialize)]
struct SectionPoint {
    time: String,
    #[serde(deserialize_with = "de_f64")]
    send: f64,
}

/// West-to-east transmission section aggregate (hourly upstream; values
/// are legitimately omitted when unchanged, hence the forward-fill applied
/// after alignment by the aggregator).
pub fn west_to_east(
    ctx: &CrawlContext,
    region: Region,
    date: chrono::NaiveDate,
) -> Result<Series, FetchError> {
    let body = json!({ "sectionId": region.code(), "operateDate": compact(date) });
    let env: Envelope<Vec<SectionPoint>> = post(ctx, Endpoint::WestToEastSection, body)?;
    Ok(env.data.data.into_iter().map(|p| (p.time, p.send)).collect())
}

// ─── Real-time disclosure adapters (bulk: failure fails the day) ────

#[derive(Debug, Deserialize)]
struct ActivePowerEntry {
    #[serde(rename = "activepowerList")]
    points: Vec<TimeValue>,
}

/// Total dispatched load, real-time disclosure.
pub fn dispatched_load_real_time(
    ctx: &CrawlContext,
    region: Region,
    date: chrono::NaiveDate,
) -> Result<Series, FetchError> {
    let body = json!({ "exchange": region.code(), "runTime": compact(date) });
    let env: Envelope<ListBody<ActivePowerEntry>> =
        post(ctx, Endpoint::DispatchedLoadRealTime, body)?;
    let entry = env
        .data
        .data
        .list
        .into_iter()
        .next()
        .ok_or_else(|| envelope_err(Endpoint::DispatchedLoadRealTime, "empty curve list"))?;
    Ok(entry.points.into_iter().map(|p| (p.time, p.value)).collect())
}

fn area_no_curve(
    ctx: &CrawlContext,
    endpoint: Endpoint,
    area_field: &str,
    region: Region,
    date: chrono::NaiveDate,
) -> Result<Series, FetchError> {
    let body = json!({ area_field: region.code(), "runTime": compact(date) });
    let env: Envelope<Vec<TimeTEnergy>> = post(ctx, endpoint, body)?;
    Ok(env.data.data.into_iter().map(|p| (p.time, p.t_energy)).collect())
}

/// Total generation output, real-time disclosure.
pub fn generation_total(
    ctx: &CrawlContext,
    region: Region,
    date: chrono::NaiveDate,
) -> Result<Series, FetchError> {
    area_no_curve(ctx, Endpoint::GenerationTotal, "areaNo", region, date)
}

/// Non-market unit total output, real-time disclosure.
pub fn non_market_total(
    ctx: &CrawlContext,
    region: Region,
    date: chrono::NaiveDate,
) -> Result<Series, FetchError> {
    area_no_curve(ctx, Endpoint::NonMarketTotal, "areaCode", region, date)
}

/// New-energy output, real-time disclosure.
pub fn new_energy_output(
    ctx: &CrawlContext,
    region: Region,
    date: chrono::NaiveDate,
) -> Result<Series, FetchError> {
    area_no_curve(ctx, Endpoint::NewEnergyOutput, "areaNo", region, date)
}

/// Hydro total output, real-time disclosure.
pub fn hydro_total(
    ctx: &CrawlContext,
    region: Region,
    date: chrono::NaiveDate,
) -> Result<Series, FetchError> {
    area_no_curve(ctx, Endpoint::HydroTotal, "areaNo", region, date)
}

#[derive(Debug, Deserialize)]
struct ChannelEntry {
    name: String,
    #[serde(rename = "mkId")]
    mk_id: String,
}

/// Inter-provincial link transmission. Two-step: resolve the provincial
/// export channel id by display name, then fetch that channel's curve.
pub fn inter_provincial(
    ctx: &CrawlContext,
    date: chrono::NaiveDate,
) -> Result<Series, FetchError> {
    let body = json!({ "runTime": compact(date) });
    let env: Envelope<Vec<ChannelEntry>> =
        post(ctx, Endpoint::InterProvincialChannels, body)?;
    let mk_id = env
        .data
        .data
        .into_iter()
        .find(|c| c.name == EXPORT_CHANNEL_NAME)
        .map(|c| c.mk_id)
        .ok_or_else(|| {
            envelope_err(
                Endpoint::InterProvincialChannels,
                format!("channel '{EXPORT_CHANNEL_NAME}' not in channel list"),
            )
        })?;

    let body = json!({ "mkId": mk_id, "runTime": compact(date) });
    let env: Envelope<Vec<TimeEnergy>> = post(ctx, Endpoint::InterProvincialCurve, body)?;
    Ok(env.data.data.into_iter().map(|p| (p.time, p.energy)).collect())
}

// ─── Node-price adapters (degrading: caller maps Err to empty) ──────

#[derive(Debug, Deserialize)]
struct TimeTimeValue {
    time: String,
    #[serde(rename = "timeValue", deserialize_with = "de_f64")]
    value: f64,
}

#[derive(Debug, Deserialize)]
struct DayAheadNodeBody {
    time: Vec<TimeTimeValue>,
}

/// Day-ahead locational price for one node. Sleeps [`PRICE_CALL_DELAY`]
/// after a successful call; callers must issue these sequentially.
pub fn day_ahead_node_price(
    ctx: &CrawlContext,
    region: Region,
    node_name: &str,
    node_id: &str,
    date: chrono::NaiveDate,
) -> Result<Series, FetchError> {
    let body = json!({
        "exchange": region.code(),
        "nodeId": node_id,
        "operatingDate": dashed(date),
        "unitName": node_name,
    });
    let env: Envelope<DayAheadNodeBody> = post(ctx, Endpoint::DayAheadNodePrice, body)?;
    let series = env.data.data.time.into_iter().map(|p| (p.time, p.value)).collect();
    std::thread::sleep(PRICE_CALL_DELAY);
    Ok(series)
}

#[derive(Debug, Deserialize)]
struct TimePrice {
    time: String,
    #[serde(deserialize_with = "de_f64")]
    price: f64,
}

/// Real-time locational price for one node. Same pacing contract as
/// [`day_ahead_node_price`]. The `areaCode` literal is an upstream wire
/// constant for the provincial real-time price query.
pub fn real_time_node_price(
    ctx: &CrawlContext,
    region: Region,
    node_id: &str,
    date: chrono::NaiveDate,
) -> Result<Series, FetchError> {
    let body = json!({
        "areaCode": "GuiZ",
        "exchange": region.code(),
        "nodeId": node_id,
        "operatingDate": dashed(date),
    });
    let env: Envelope<Vec<TimePrice>> = post(ctx, Endpoint::RealTimeNodePrice, body)?;
    let series = env.data.data.into_iter().map(|p| (p.time, p.price)).collect();
    std::thread::sleep(PRICE_CALL_DELAY);
    Ok(series)
}

// ─── Trade-result and area-average adapters (station queries) ───────

/// One hourly settlement point for a generation unit: cleared volume and
/// price.
#[derive(Debug, Clone, PartialEq)]
pub struct TradePoint {
    pub time: String,
    pub volume: f64,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
struct TradeInfo {
    time: String,
    #[serde(rename = "timeValue", deserialize_with = "de_f64")]
    time_value: f64,
    #[serde(rename = "hourPrice", deserialize_with = "de_f64")]
    hour_price: f64,
}

#[derive(Debug, Deserialize)]
struct TradeEntry {
    #[serde(rename = "infoList")]
    info_list: Vec<TradeInfo>,
}

fn trade_result(
    ctx: &CrawlContext,
    endpoint: Endpoint,
    unit_id: &str,
    date: chrono::NaiveDate,
) -> Result<Vec<TradePoint>, FetchError> {
    let body = json!({ "operatingDate": dashed(date), "unitId": unit_id });
    let env: Envelope<Vec<TradeEntry>> = post(ctx, endpoint, body)?;
    let entry = env
        .data
        .data
        .into_iter()
        .next()
        .ok_or_else(|| envelope_err(endpoint, "empty result list"))?;
    Ok(entry
        .info_list
        .into_iter()
        .map(|p| TradePoint {
            time: p.time,
            volume: p.time_value,
            price: p.hour_price,
        })
        .collect())
}

/// Day-ahead trade result (generation side) for one unit.
pub fn day_ahead_trade_result(
    ctx: &CrawlContext,
    unit_id: &str,
    date: chrono::NaiveDate,
) -> Result<Vec<TradePoint>, FetchError> {
    trade_result(ctx, Endpoint::DayAheadTradeResultGen, unit_id, date)
}

/// Real-time trade result (generation side) for one unit.
pub fn real_time_trade_result(
    ctx: &CrawlContext,
    unit_id: &str,
    date: chrono::NaiveDate,
) -> Result<Vec<TradePoint>, FetchError> {
    trade_result(ctx, Endpoint::RealTimeTradeResultGen, unit_id, date)
}

/// Region-level average deal prices for one timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AreaAverages {
    pub generation_side: Option<f64>,
    pub consumption_side: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AreaDealEntry {
    #[serde(rename = "powerDealAvg", default, deserialize_with = "de_opt_f64")]
    power_deal_avg: Option<f64>,
    #[serde(rename = "userDealAvg", default, deserialize_with = "de_opt_f64")]
    user_deal_avg: Option<f64>,
}

/// Top-level `{"data": [...]}` envelope — this endpoint family skips the
/// inner `data.data` nesting.
#[derive(Debug, Deserialize)]
struct FlatEnvelope<T> {
    data: T,
}

/// Average deal price for one region and timeframe.
pub fn area_average_price(
    ctx: &CrawlContext,
    region: Region,
    timeframe: Timeframe,
    date: chrono::NaiveDate,
) -> Result<AreaAverages, FetchError> {
    let body = json!({
        "dateId": timeframe.date_id(),
        "exchange": region.code(),
        "operateDate": dashed(date),
    });
    let env: FlatEnvelope<Vec<AreaDealEntry>> = post(ctx, Endpoint::AreaAveragePrice, body)?;
    let entry = env
        .data
        .into_iter()
        .next()
        .ok_or_else(|| envelope_err(Endpoint::AreaAveragePrice, "empty deal list"))?;
    Ok(AreaAverages {
        generation_side: entry.power_deal_avg,
        consumption_side: entry.user_deal_avg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_formats_per_endpoint_convention() {
        let d = chrono::NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
        assert_eq!(compact(d), "20250815");
        assert_eq!(dashed(d), "2025-08-15");
    }

    #[test]
    fn envelope_unwraps_nested_data() {
        let raw = r#"{"status":0,"data":{"data":[
            {"time":"00:00","energy":"1234.5"},
            {"time":"00:15","energy":1250}
        ]}}"#;
        let env: Envelope<Vec<TimeEnergy>> = serde_json::from_str(raw).unwrap();
        assert_eq!(env.data.data.len(), 2);
        assert_eq!(env.data.data[0].energy, 1234.5);
        assert_eq!(env.data.data[1].energy, 1250.0);
    }

    #[test]
    fn reserve_envelope_unwraps_lmplist() {
        let raw = r#"{"data":{"data":{"list":[
            {"lmplist":[{"time":"00:00","value":"300"}]}
        ]}}}"#;
        let env: Envelope<ListBody<ReserveEntry>> = serde_json::from_str(raw).unwrap();
        assert_eq!(env.data.data.list[0].points[0].value, 300.0);
    }

    #[test]
    fn area_deal_tolerates_null_averages() {
        let raw = r#"{"data":[{"powerDealAvg":null,"userDealAvg":"412.07"}]}"#;
        let env: FlatEnvelope<Vec<AreaDealEntry>> = serde_json::from_str(raw).unwrap();
        assert_eq!(env.data[0].power_deal_avg, None);
        assert_eq!(env.data[0].user_deal_avg, Some(412.07));
    }

    #[test]
    fn trade_info_maps_volume_and_price() {
        let raw = r#"{"data":{"data":[{"infoList":[
            {"time":"01:00","timeValue":"12.5","hourPrice":401.2}
        ]}]}}"#;
        let env: Envelope<Vec<TradeEntry>> = serde_json::from_str(raw).unwrap();
        let p = &env.data.data[0].info_list[0];
        assert_eq!(p.time_value, 12.5);
        assert_eq!(p.hour_price, 401.2);
    }

    #[test]
    fn non_numeric_string_is_an_error() {
        let raw = r#"{"data":{"data":[{"time":"00:00","energy":"n/a"}]}}"#;
        let parsed: Result<Envelope<Vec<TimeEnergy>>, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }
}
