//! Order, trade, and position records exchanged between subsystems

use serde::{Deserialize, Serialize};

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buying side
    Buy,
    /// Selling side
    Sell,
}

/// Intent of an order relative to the current position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OffsetFlag {
    /// Increase the position
    Open,
    /// Decrease the position
    Close,
    /// Decrease today's position
    CloseToday,
    /// Decrease yesterday's position
    CloseYesterday,
}

/// Order pricing type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Fill at the prevailing quote
    Market,
    /// Fill only at the limit price or better
    Limit,
}

/// Order lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted, nothing filled yet
    New,
    /// Some volume filled, remainder pending
    PartiallyFilled,
    /// Fully filled
    Filled,
    /// Canceled before completion
    Canceled,
    /// Refused by the broker
    Rejected,
}

/// A request to place an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    /// Trading account identifier
    pub account_id: String,
    /// Caller-assigned order identifier
    pub client_order_id: String,
    /// Identifier of the originating strategy
    pub strategy_id: String,
    /// Instrument to trade
    pub instrument_id: String,
    /// Buy or sell
    pub side: Side,
    /// Open or close intent
    pub offset: OffsetFlag,
    /// Market or limit
    pub order_type: OrderType,
    /// Requested volume (must be positive)
    pub volume: i32,
    /// Limit price (ignored for market orders)
    pub price: f64,
    /// Intent creation time in nanoseconds since epoch
    pub ts_ns: i64,
    /// Correlation identifier for tracing
    pub trace_id: String,
}

/// An accepted order and its fill progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Broker-assigned order identifier
    pub order_id: String,
    /// Trading account identifier
    pub account_id: String,
    /// Caller-assigned order identifier
    pub client_order_id: String,
    /// Identifier of the originating strategy
    pub strategy_id: String,
    /// Instrument symbol
    pub symbol: String,
    /// Exchange identifier
    pub exchange: String,
    /// Buy or sell
    pub side: Side,
    /// Open or close intent
    pub offset: OffsetFlag,
    /// Market or limit
    pub order_type: OrderType,
    /// Limit price (ignored for market orders)
    pub price: f64,
    /// Requested volume
    pub quantity: i32,
    /// Volume filled so far
    pub filled_quantity: i32,
    /// Price of the most recent fill
    pub avg_fill_price: f64,
    /// Lifecycle state
    pub status: OrderStatus,
    /// Creation time in nanoseconds since epoch
    pub created_at_ns: i64,
    /// Last update time in nanoseconds since epoch
    pub updated_at_ns: i64,
    /// Correlation identifier for tracing
    pub trace_id: String,
}

/// An executed fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Broker-assigned trade identifier
    pub trade_id: String,
    /// Identifier of the filled order
    pub order_id: String,
    /// Trading account identifier
    pub account_id: String,
    /// Identifier of the originating strategy
    pub strategy_id: String,
    /// Instrument symbol
    pub symbol: String,
    /// Exchange identifier
    pub exchange: String,
    /// Buy or sell
    pub side: Side,
    /// Open or close intent
    pub offset: OffsetFlag,
    /// Fill price
    pub price: f64,
    /// Fill volume
    pub quantity: i32,
    /// Fill time in nanoseconds since epoch
    pub trade_ts_ns: i64,
    /// Commission charged for this fill
    pub commission: f64,
}

/// Per-instrument position summary derived from open lots
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument symbol
    pub symbol: String,
    /// Outstanding long volume
    pub long_qty: i32,
    /// Outstanding short volume
    pub short_qty: i32,
}
