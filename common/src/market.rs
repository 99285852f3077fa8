//! Market data records

use serde::{Deserialize, Serialize};

/// Level-1 market data sample with last trade and aggregate volumes
///
/// Missing bid/ask quotes are carried as `0.0` and substituted with
/// `last_price` by consumers.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Instrument symbol
    pub symbol: String,
    /// Exchange identifier
    pub exchange: String,
    /// Event timestamp in nanoseconds since epoch
    pub ts_ns: i64,
    /// Last traded price
    pub last_price: f64,
    /// Volume of the last trade
    pub last_volume: i32,
    /// Best bid price (0.0 when unknown)
    pub bid_price1: f64,
    /// Volume at the best bid
    pub bid_volume1: i32,
    /// Best ask price (0.0 when unknown)
    pub ask_price1: f64,
    /// Volume at the best ask
    pub ask_volume1: i32,
    /// Cumulative session volume
    pub volume: i64,
    /// Cumulative session turnover
    pub turnover: f64,
    /// Open interest
    pub open_interest: i64,
}

impl Tick {
    /// Best bid, substituting `last_price` when the quote is missing
    #[must_use]
    pub fn bid_or_last(&self) -> f64 {
        if self.bid_price1 > 0.0 {
            self.bid_price1
        } else {
            self.last_price
        }
    }

    /// Best ask, substituting `last_price` when the quote is missing
    #[must_use]
    pub fn ask_or_last(&self) -> f64 {
        if self.ask_price1 > 0.0 {
            self.ask_price1
        } else {
            self.last_price
        }
    }
}

/// Aggregated OHLCV bar
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Instrument symbol
    pub symbol: String,
    /// Exchange identifier
    pub exchange: String,
    /// Bar open timestamp in nanoseconds since epoch
    pub ts_ns: i64,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Traded volume over the bar
    pub volume: i64,
}
