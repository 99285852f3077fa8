//! Strategy entry points and the bound trading context

use crate::broker::SimulatedBroker;
use common::{Bar, OffsetFlag, Order, OrderIntent, OrderType, Side, Tick, Trade, Ts};
use feeds::FeedControl;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by strategy actions
#[derive(Debug, Error)]
pub enum StrategyError {
    /// An action was invoked before the engine bound the context
    #[error("strategy context is not bound")]
    NotBound,
}

/// Strategy callbacks driven by the backtest engine
///
/// Every entry point receives the bound [`StrategyContext`] through which
/// orders are placed and canceled. Default implementations do nothing.
pub trait Strategy {
    /// Called once before the replay starts
    fn initialize(&mut self, ctx: &mut StrategyContext) {
        let _ = ctx;
    }

    /// Called for every dispatched tick, before the broker matches it
    fn on_tick(&mut self, tick: &Tick, ctx: &mut StrategyContext) {
        let _ = (tick, ctx);
    }

    /// Called for every dispatched bar
    fn on_bar(&mut self, bar: &Bar, ctx: &mut StrategyContext) {
        let _ = (bar, ctx);
    }

    /// Called for every order state transition
    fn on_order(&mut self, order: &Order, ctx: &mut StrategyContext) {
        let _ = (order, ctx);
    }

    /// Called for every executed fill
    fn on_trade(&mut self, trade: &Trade, ctx: &mut StrategyContext) {
        let _ = (trade, ctx);
    }
}

/// Non-owning back-references to the feed and broker, bound once by the
/// engine at construction
#[derive(Default)]
pub struct StrategyContext {
    broker: Option<Rc<RefCell<SimulatedBroker>>>,
    control: Option<Arc<FeedControl>>,
    order_seq: i64,
}

impl StrategyContext {
    /// An unbound context; every action fails with `NotBound`
    #[must_use]
    pub fn unbound() -> Self {
        Self::default()
    }

    pub(crate) fn bound(control: Arc<FeedControl>, broker: Rc<RefCell<SimulatedBroker>>) -> Self {
        Self {
            broker: Some(broker),
            control: Some(control),
            order_seq: 0,
        }
    }

    /// Place a limit buy opening a long position. Returns the order id.
    pub fn buy(&mut self, symbol: &str, price: f64, volume: i32) -> Result<String, StrategyError> {
        self.place(symbol, Side::Buy, OffsetFlag::Open, price, volume, "buy")
    }

    /// Place a limit sell closing a long position. Returns the order id.
    pub fn sell(&mut self, symbol: &str, price: f64, volume: i32) -> Result<String, StrategyError> {
        self.place(symbol, Side::Sell, OffsetFlag::Close, price, volume, "sell")
    }

    /// Cancel a previously placed order; `Ok(false)` when it is unknown,
    /// filled, or already canceled
    pub fn cancel_order(&mut self, order_id: &str) -> Result<bool, StrategyError> {
        let broker = self.broker.as_ref().ok_or(StrategyError::NotBound)?;
        Ok(broker.borrow_mut().cancel_order(order_id))
    }

    /// Timestamp of the feed's last dispatched event
    pub fn current_time(&self) -> Result<Ts, StrategyError> {
        let control = self.control.as_ref().ok_or(StrategyError::NotBound)?;
        Ok(control.current_time())
    }

    /// Request cooperative termination of the replay
    pub fn stop(&self) -> Result<(), StrategyError> {
        let control = self.control.as_ref().ok_or(StrategyError::NotBound)?;
        control.stop();
        Ok(())
    }

    fn place(
        &mut self,
        symbol: &str,
        side: Side,
        offset: OffsetFlag,
        price: f64,
        volume: i32,
        kind: &str,
    ) -> Result<String, StrategyError> {
        let broker = self.broker.as_ref().ok_or(StrategyError::NotBound)?.clone();
        let ts = self
            .control
            .as_ref()
            .map_or_else(Ts::now, |control| control.current_time());

        self.order_seq += 1;
        let client_order_id = format!("{kind}-{}", self.order_seq);
        let intent = OrderIntent {
            account_id: "sim-account".to_string(),
            client_order_id: client_order_id.clone(),
            strategy_id: "strategy".to_string(),
            instrument_id: symbol.to_string(),
            side,
            offset,
            order_type: OrderType::Limit,
            volume,
            price,
            ts_ns: ts.as_nanos(),
            trace_id: client_order_id,
        };
        Ok(broker.borrow_mut().place_order(&intent))
    }
}
