//! Backtest composition root: binds feed, strategy, and broker, and
//! records the result bundle

use crate::broker::{BrokerEvent, SimulatedBroker};
use crate::strategy::{Strategy, StrategyContext};
use common::{Order, Tick, Trade, Ts};
use feeds::DataFeed;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::info;

/// One sample of the balance-vs-time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Timestamp of the dispatched tick
    pub time: Ts,
    /// Account balance after the tick was processed
    pub balance: f64,
}

/// Chronological record of one backtest run
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Every order state transition, in emission order
    pub orders: Vec<Order>,
    /// Every executed fill, in emission order
    pub trades: Vec<Trade>,
    /// Balance after each dispatched tick
    pub equity_curve: Vec<EquityPoint>,
}

struct EngineCore<S: Strategy> {
    strategy: S,
    ctx: StrategyContext,
    broker: Rc<RefCell<SimulatedBroker>>,
    result: BacktestResult,
}

impl<S: Strategy> EngineCore<S> {
    fn handle_tick(&mut self, tick: &Tick) {
        self.strategy.on_tick(tick, &mut self.ctx);
        self.dispatch_broker_events();

        self.broker.borrow_mut().on_tick(tick);
        self.dispatch_broker_events();

        let balance = self.broker.borrow().account_balance();
        self.result.equity_curve.push(EquityPoint {
            time: Ts::from_nanos(tick.ts_ns),
            balance,
        });
    }

    /// Forward queued broker updates into the result bundle and the
    /// strategy. Strategy callbacks may place further orders, so drain
    /// until the queue stays empty.
    fn dispatch_broker_events(&mut self) {
        loop {
            let events = self.broker.borrow_mut().drain_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                match event {
                    BrokerEvent::Order(order) => {
                        self.result.orders.push(order.clone());
                        self.strategy.on_order(&order, &mut self.ctx);
                    }
                    BrokerEvent::Trade(trade) => {
                        self.result.trades.push(trade.clone());
                        self.strategy.on_trade(&trade, &mut self.ctx);
                    }
                }
            }
        }
    }
}

/// Drives one backtest run to completion
pub struct BacktestEngine<F: DataFeed, S: Strategy> {
    feed: F,
    core: Rc<RefCell<EngineCore<S>>>,
}

impl<F: DataFeed, S: Strategy + 'static> BacktestEngine<F, S> {
    /// Bind `strategy` to `broker` and `feed`
    pub fn new(feed: F, broker: SimulatedBroker, strategy: S) -> Self {
        let broker = Rc::new(RefCell::new(broker));
        let ctx = StrategyContext::bound(feed.control(), Rc::clone(&broker));
        let core = Rc::new(RefCell::new(EngineCore {
            strategy,
            ctx,
            broker,
            result: BacktestResult::default(),
        }));
        Self { feed, core }
    }

    /// Initialize the strategy, subscribe to every symbol, and replay
    /// the feed to exhaustion (or until stopped)
    pub fn run(&mut self) {
        info!("starting backtest run");
        {
            let mut guard = self.core.borrow_mut();
            let core = &mut *guard;
            core.strategy.initialize(&mut core.ctx);
            core.dispatch_broker_events();
        }

        let core = Rc::clone(&self.core);
        self.feed.subscribe(
            &[],
            Some(Box::new(move |tick: &Tick| {
                core.borrow_mut().handle_tick(tick);
            })),
            None,
        );
        self.feed.run();

        let core = self.core.borrow();
        info!(
            orders = core.result.orders.len(),
            trades = core.result.trades.len(),
            equity_points = core.result.equity_curve.len(),
            "backtest run complete"
        );
    }

    /// Snapshot of the result bundle
    #[must_use]
    pub fn result(&self) -> BacktestResult {
        self.core.borrow().result.clone()
    }

    /// Shared handle to the simulated broker (positions, balance)
    #[must_use]
    pub fn broker_handle(&self) -> Rc<RefCell<SimulatedBroker>> {
        Rc::clone(&self.core.borrow().broker)
    }

    /// Consume the engine, returning the result bundle without cloning
    /// when possible
    #[must_use]
    pub fn into_result(self) -> BacktestResult {
        drop(self.feed);
        match Rc::try_unwrap(self.core) {
            Ok(cell) => cell.into_inner().result,
            Err(core) => core.borrow().result.clone(),
        }
    }
}
