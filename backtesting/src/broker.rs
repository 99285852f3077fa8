//! Simulated broker: deterministic per-symbol matching with cash and
//! position-lot bookkeeping

use common::{OffsetFlag, Order, OrderIntent, OrderStatus, OrderType, Position, Side, Tick, Trade};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Broker simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Starting cash balance
    pub initial_capital: f64,
    /// Commission rate applied to opening fills
    pub commission_rate: f64,
    /// Commission rate applied to closing fills
    pub close_commission_rate: f64,
    /// Absolute price slippage added against the order side
    pub slippage: f64,
    /// Whether fills are capped by the tick's traded volume
    pub partial_fill_enabled: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            initial_capital: 1_000_000.0,
            commission_rate: 0.0001,
            close_commission_rate: 0.0002,
            slippage: 0.0,
            partial_fill_enabled: true,
        }
    }
}

/// Order and trade updates emitted by the broker, drained by the engine
#[derive(Debug, Clone)]
pub enum BrokerEvent {
    /// An order transitioned state
    Order(Order),
    /// A fill was executed
    Trade(Trade),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LotDirection {
    Long,
    Short,
}

#[derive(Debug)]
struct PositionLot {
    direction: LotDirection,
    volume: i32,
    open_price: f64,
}

#[derive(Debug)]
struct PendingOrder {
    order: Order,
    offset: OffsetFlag,
    remaining_volume: i32,
    is_market: bool,
}

/// Matching engine over pending orders plus cash and position state
pub struct SimulatedBroker {
    config: BrokerConfig,
    buy_orders: Vec<PendingOrder>,
    sell_orders: Vec<PendingOrder>,
    lots_by_symbol: FxHashMap<String, Vec<PositionLot>>,
    last_tick_by_symbol: FxHashMap<String, Tick>,
    account_balance: f64,
    id_seed: i64,
    events: VecDeque<BrokerEvent>,
}

impl SimulatedBroker {
    /// Create a broker with `config`
    #[must_use]
    pub fn new(config: BrokerConfig) -> Self {
        let account_balance = config.initial_capital;
        Self {
            config,
            buy_orders: Vec::new(),
            sell_orders: Vec::new(),
            lots_by_symbol: FxHashMap::default(),
            last_tick_by_symbol: FxHashMap::default(),
            account_balance,
            id_seed: 0,
            events: VecDeque::new(),
        }
    }

    /// Record the tick and run one matching pass over both sides
    pub fn on_tick(&mut self, tick: &Tick) {
        self.last_tick_by_symbol
            .insert(tick.symbol.clone(), tick.clone());

        let mut buys = std::mem::take(&mut self.buy_orders);
        for pending in &mut buys {
            if pending.remaining_volume <= 0 || pending.order.symbol != tick.symbol {
                continue;
            }
            self.try_match(pending, tick);
        }
        buys.retain(|pending| {
            pending.remaining_volume > 0 && pending.order.status != OrderStatus::Canceled
        });
        self.buy_orders = buys;

        let mut sells = std::mem::take(&mut self.sell_orders);
        for pending in &mut sells {
            if pending.remaining_volume <= 0 || pending.order.symbol != tick.symbol {
                continue;
            }
            self.try_match(pending, tick);
        }
        sells.retain(|pending| {
            pending.remaining_volume > 0 && pending.order.status != OrderStatus::Canceled
        });
        self.sell_orders = sells;
    }

    /// Accept an order, emit its `New` update, and immediately attempt a
    /// match against the symbol's last tick. Returns the order id.
    pub fn place_order(&mut self, intent: &OrderIntent) -> String {
        self.id_seed += 1;
        let order = Order {
            order_id: format!("ord-{}", self.id_seed),
            account_id: intent.account_id.clone(),
            client_order_id: intent.client_order_id.clone(),
            strategy_id: intent.strategy_id.clone(),
            symbol: intent.instrument_id.clone(),
            exchange: String::new(),
            side: intent.side,
            offset: intent.offset,
            order_type: intent.order_type,
            price: intent.price,
            quantity: intent.volume,
            filled_quantity: 0,
            avg_fill_price: 0.0,
            status: OrderStatus::New,
            created_at_ns: intent.ts_ns,
            updated_at_ns: intent.ts_ns,
            trace_id: intent.trace_id.clone(),
        };
        let order_id = order.order_id.clone();
        debug!(
            order_id = %order_id,
            symbol = %order.symbol,
            side = ?intent.side,
            volume = intent.volume,
            "order accepted"
        );
        self.events.push_back(BrokerEvent::Order(order.clone()));

        let pending = PendingOrder {
            offset: intent.offset,
            remaining_volume: intent.volume,
            is_market: intent.order_type == OrderType::Market,
            order,
        };
        match intent.side {
            Side::Buy => self.buy_orders.push(pending),
            Side::Sell => self.sell_orders.push(pending),
        }

        if let Some(tick) = self.last_tick_by_symbol.get(&intent.instrument_id).cloned() {
            self.on_tick(&tick);
        }

        order_id
    }

    /// Cancel a pending order by id. Filled or already-canceled orders
    /// are untouched and yield `false`.
    pub fn cancel_order(&mut self, order_id: &str) -> bool {
        fn cancel_in(orders: &mut [PendingOrder], order_id: &str) -> Option<Order> {
            for pending in orders {
                if pending.order.order_id != order_id || pending.remaining_volume <= 0 {
                    continue;
                }
                pending.order.status = OrderStatus::Canceled;
                pending.remaining_volume = 0;
                return Some(pending.order.clone());
            }
            None
        }

        let canceled =
            cancel_in(&mut self.buy_orders, order_id).or_else(|| cancel_in(&mut self.sell_orders, order_id));
        match canceled {
            Some(order) => {
                debug!(order_id = %order.order_id, "order canceled");
                self.events.push_back(BrokerEvent::Order(order));
                true
            }
            None => false,
        }
    }

    /// Position summaries derived from open lots, optionally filtered by
    /// symbol; sorted by symbol
    #[must_use]
    pub fn positions(&self, symbol: Option<&str>) -> Vec<Position> {
        let mut result = Vec::new();
        for (instrument, lots) in &self.lots_by_symbol {
            if let Some(wanted) = symbol {
                if instrument != wanted {
                    continue;
                }
            }
            let mut position = Position {
                symbol: instrument.clone(),
                ..Position::default()
            };
            for lot in lots {
                match lot.direction {
                    LotDirection::Long => position.long_qty += lot.volume,
                    LotDirection::Short => position.short_qty += lot.volume,
                }
            }
            result.push(position);
        }
        result.sort_by(|left, right| left.symbol.cmp(&right.symbol));
        result
    }

    /// Current cash balance
    #[must_use]
    pub fn account_balance(&self) -> f64 {
        self.account_balance
    }

    /// Take every queued order/trade update, oldest first
    pub fn drain_events(&mut self) -> Vec<BrokerEvent> {
        self.events.drain(..).collect()
    }

    fn try_match(&mut self, pending: &mut PendingOrder, tick: &Tick) {
        if pending.remaining_volume <= 0 {
            return;
        }

        let bid = tick.bid_or_last();
        let ask = tick.ask_or_last();

        let (should_fill, match_price) = if pending.is_market {
            let price = match pending.order.side {
                Side::Buy => ask,
                Side::Sell => bid,
            };
            (true, price)
        } else {
            match pending.order.side {
                Side::Buy => (pending.order.price >= ask, pending.order.price),
                Side::Sell => (pending.order.price <= bid, pending.order.price),
            }
        };
        if !should_fill {
            return;
        }

        let available_liquidity = if tick.last_volume > 0 {
            tick.last_volume
        } else {
            pending.remaining_volume
        };
        let fill_qty = if self.config.partial_fill_enabled {
            pending.remaining_volume.min(available_liquidity).max(1)
        } else {
            pending.remaining_volume
        };

        let filled_price = self.apply_slippage(match_price, pending.order.side);
        let commission = self.commission(pending.offset, fill_qty, filled_price);

        pending.remaining_volume -= fill_qty;
        pending.order.filled_quantity += fill_qty;
        pending.order.avg_fill_price = filled_price;
        pending.order.updated_at_ns = tick.ts_ns;
        pending.order.status = if pending.remaining_volume == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };

        self.id_seed += 1;
        let trade = Trade {
            trade_id: format!("trd-{}", self.id_seed),
            order_id: pending.order.order_id.clone(),
            account_id: pending.order.account_id.clone(),
            strategy_id: pending.order.strategy_id.clone(),
            symbol: pending.order.symbol.clone(),
            exchange: pending.order.exchange.clone(),
            side: pending.order.side,
            offset: pending.offset,
            price: filled_price,
            quantity: fill_qty,
            trade_ts_ns: tick.ts_ns,
            commission,
        };
        debug!(
            trade_id = %trade.trade_id,
            order_id = %trade.order_id,
            price = trade.price,
            quantity = trade.quantity,
            "fill executed"
        );

        self.apply_trade_to_position(&trade);
        self.account_balance -= commission;

        self.events.push_back(BrokerEvent::Order(pending.order.clone()));
        self.events.push_back(BrokerEvent::Trade(trade));
    }

    fn apply_slippage(&self, raw_price: f64, side: Side) -> f64 {
        if self.config.slippage <= 0.0 {
            return raw_price;
        }
        match side {
            Side::Buy => raw_price + self.config.slippage,
            Side::Sell => raw_price - self.config.slippage,
        }
    }

    fn commission(&self, offset: OffsetFlag, fill_qty: i32, fill_price: f64) -> f64 {
        let amount = fill_price * f64::from(fill_qty);
        let rate = if offset == OffsetFlag::Open {
            self.config.commission_rate
        } else {
            self.config.close_commission_rate
        };
        amount * rate
    }

    fn apply_trade_to_position(&mut self, trade: &Trade) {
        let lots = self.lots_by_symbol.entry(trade.symbol.clone()).or_default();

        if trade.offset == OffsetFlag::Open {
            lots.push(PositionLot {
                direction: match trade.side {
                    Side::Buy => LotDirection::Long,
                    Side::Sell => LotDirection::Short,
                },
                volume: trade.quantity,
                open_price: trade.price,
            });
            return;
        }

        // Sell closes long lots, buy closes short lots; FIFO, over-close
        // truncates at the outstanding volume.
        let direction_to_consume = match trade.side {
            Side::Sell => LotDirection::Long,
            Side::Buy => LotDirection::Short,
        };
        let mut qty_to_close = trade.quantity;
        let mut realized = 0.0;
        lots.retain_mut(|lot| {
            if qty_to_close <= 0 || lot.direction != direction_to_consume || lot.volume <= 0 {
                return true;
            }
            let matched = lot.volume.min(qty_to_close);
            realized += match direction_to_consume {
                LotDirection::Long => (trade.price - lot.open_price) * f64::from(matched),
                LotDirection::Short => (lot.open_price - trade.price) * f64::from(matched),
            };
            lot.volume -= matched;
            qty_to_close -= matched;
            lot.volume > 0
        });
        self.account_balance += realized;
    }
}

impl Default for SimulatedBroker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}
