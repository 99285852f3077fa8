//! Core types shared across the backtesting platform

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod fixed;
pub mod market;
pub mod orders;
pub mod time;

pub use fixed::{RoundingMode, rescale, to_f64, to_scaled};
pub use market::{Bar, Tick};
pub use orders::{
    OffsetFlag, Order, OrderIntent, OrderStatus, OrderType, Position, Side, Trade,
};
pub use time::{TimeError, Ts};
