//! Endpoint registry — logical series names mapped to upstream URLs.
//!
//! The upstream API is one service with many POST endpoints, each with its
//! own request schema and response envelope. Making the registry an enum
//! means an unknown series name is unrepresentable rather than a runtime
//! lookup failure, and collapses the duplicate URL registrations the
//! upstream client history accumulated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const BASE: &str = "https://spot.poweremarket.com/uptspot/ma/spot/spottrade/scptp/sr/mp/spottrade";

/// One logical data series (or lookup) on the upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Total dispatched load, day-ahead disclosure.
    DispatchedLoad,
    /// Non-market unit output excluding new energy, forecast.
    NonMarketExNewEnergyForecast,
    /// New-energy total output, daily disclosure.
    NewEnergyDayTotal,
    /// Positive/negative reserve capacity (discriminated by `positiveType`).
    Reserve,
    /// West-to-east transmission section aggregate.
    WestToEastSection,
    /// Day-ahead node price query.
    DayAheadNodePrice,
    /// Real-time node price query.
    RealTimeNodePrice,
    /// Day-ahead trade result, generation side (per unit).
    DayAheadTradeResultGen,
    /// Real-time trade result, generation side (per unit).
    RealTimeTradeResultGen,
    /// Region-level average deal price (discriminated by `dateId`).
    AreaAveragePrice,
    /// Total dispatched load, real-time disclosure.
    DispatchedLoadRealTime,
    /// Total generation output, real-time disclosure.
    GenerationTotal,
    /// Non-market unit total output, real-time disclosure.
    NonMarketTotal,
    /// New-energy output, real-time disclosure.
    NewEnergyOutput,
    /// Hydro total output, real-time disclosure.
    HydroTotal,
    /// Inter-provincial link channel-name lookup (step one of two).
    InterProvincialChannels,
    /// Inter-provincial link transmission curve (step two of two).
    InterProvincialCurve,
}

impl Endpoint {
    /// Upstream URL for this endpoint.
    pub fn url(self) -> String {
        let path = match self {
            Endpoint::DispatchedLoad => "intePublishDayAutotuneCurve/getObj",
            Endpoint::NonMarketExNewEnergyForecast => "mkXhNonMarketEleNewPowerPre/getList",
            Endpoint::NewEnergyDayTotal => "intePublishNewEnergyDay/getList",
            Endpoint::Reserve => "intePublishPositiveNegative/getListPage",
            Endpoint::WestToEastSection => "spotTpaTransSection/getSectionCollectList",
            Endpoint::DayAheadNodePrice => "tdSpotRecentlyNodeInfo/selectGetrecentlyNodeInfo",
            Endpoint::RealTimeNodePrice => "tdSpotRealClearNodePrice/nodePriceQuery",
            Endpoint::DayAheadTradeResultGen => "tdSpotRecentlyResultGenInfo/getList",
            Endpoint::RealTimeTradeResultGen => "tdSpotRealClearUnitResultInfo/getList",
            Endpoint::AreaAveragePrice => "baseinfo/TranOver/getWatchDealCountData",
            Endpoint::DispatchedLoadRealTime => "intePublishVolumeUpCurve/getListPage",
            Endpoint::GenerationTotal => "mkGenElecPowerTotalOutput/getObject",
            Endpoint::NonMarketTotal => "mkNonMarketUnitAllOutput/getObject",
            Endpoint::NewEnergyOutput => "mkNewEnergyTotalOutputDx/getObject",
            Endpoint::HydroTotal => "mkWaterElecTicTotalOutput/getObject",
            Endpoint::InterProvincialChannels => "mkInnerProvLinkTransSitu/getChannelName",
            Endpoint::InterProvincialCurve => "mkInnerProvLinkTransSitu/getObject",
        };
        format!("{BASE}/{path}")
    }

    /// Short name used in error messages and log lines.
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::DispatchedLoad => "dispatched_load",
            Endpoint::NonMarketExNewEnergyForecast => "non_market_ex_new_energy_forecast",
            Endpoint::NewEnergyDayTotal => "new_energy_day_total",
            Endpoint::Reserve => "reserve",
            Endpoint::WestToEastSection => "west_to_east_section",
            Endpoint::DayAheadNodePrice => "day_ahead_node_price",
            Endpoint::RealTimeNodePrice => "real_time_node_price",
            Endpoint::DayAheadTradeResultGen => "day_ahead_trade_result_gen",
            Endpoint::RealTimeTradeResultGen => "real_time_trade_result_gen",
            Endpoint::AreaAveragePrice => "area_average_price",
            Endpoint::DispatchedLoadRealTime => "dispatched_load_real_time",
            Endpoint::GenerationTotal => "generation_total",
            Endpoint::NonMarketTotal => "non_market_total",
            Endpoint::NewEnergyOutput => "new_energy_output",
            Endpoint::HydroTotal => "hydro_total",
            Endpoint::InterProvincialChannels => "inter_provincial_channels",
            Endpoint::InterProvincialCurve => "inter_provincial_curve",
        }
    }
}

/// Region of the southern spot market, mapped to its wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    FullRegion,
    Guangdong,
    Guangxi,
    Yunnan,
    Guizhou,
    Hainan,
}

impl Region {
    /// All regions, in upstream code order. Used by the area-average
    /// price query, which iterates every region.
    pub const ALL: [Region; 6] = [
        Region::FullRegion,
        Region::Guangdong,
        Region::Guangxi,
        Region::Yunnan,
        Region::Guizhou,
        Region::Hainan,
    ];

    /// Two-digit code used in request payloads.
    pub fn code(self) -> &'static str {
        match self {
            Region::FullRegion => "00",
            Region::Guangdong => "02",
            Region::Guangxi => "03",
            Region::Yunnan => "04",
            Region::Guizhou => "05",
            Region::Hainan => "06",
        }
    }

    /// Stable lowercase name, used for CLI parsing and table indexes.
    pub fn slug(self) -> &'static str {
        match self {
            Region::FullRegion => "full_region",
            Region::Guangdong => "guangdong",
            Region::Guangxi => "guangxi",
            Region::Yunnan => "yunnan",
            Region::Guizhou => "guizhou",
            Region::Hainan => "hainan",
        }
    }
}

impl Default for Region {
    fn default() -> Self {
        Region::Guizhou
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|r| r.slug() == s || r.code() == s)
            .ok_or_else(|| format!("unknown region '{s}' (expected one of: full_region, guangdong, guangxi, yunnan, guizhou, hainan)"))
    }
}
