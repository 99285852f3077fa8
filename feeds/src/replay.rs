//! Deterministic replay feed over the partitioned tick store

use crate::{BarCallback, DataFeed, FeedControl, MarketEvent, TickCallback};
use common::{Bar, Tick, Ts};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;
use storage::PartitionedTickStore;
use tracing::{debug, info};

/// Heap entry ordered by `(ts_ns, seq)`; `seq` is the insertion counter
/// that makes timestamp ties stable.
#[derive(Debug)]
struct QueuedEvent {
    ts_ns: i64,
    seq: u64,
    event: MarketEvent,
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.ts_ns == other.ts_ns && self.seq == other.seq
    }
}

impl Eq for QueuedEvent {}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ts_ns
            .cmp(&other.ts_ns)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Replays stored ticks through subscriber callbacks in time order
pub struct ReplayFeed {
    store: Arc<PartitionedTickStore>,
    start: Ts,
    end: Ts,
    control: Arc<FeedControl>,
    queue: BinaryHeap<Reverse<QueuedEvent>>,
    seq: u64,
    symbols: Vec<String>,
    on_tick: Option<TickCallback>,
    on_bar: Option<BarCallback>,
}

impl ReplayFeed {
    /// Create a replay feed over `store` bounded by `[start, end]`
    #[must_use]
    pub fn new(store: Arc<PartitionedTickStore>, start: Ts, end: Ts) -> Self {
        Self {
            store,
            start,
            end,
            control: Arc::new(FeedControl::new(start)),
            queue: BinaryHeap::new(),
            seq: 0,
            symbols: Vec::new(),
            on_tick: None,
            on_bar: None,
        }
    }

    /// Number of queued events awaiting dispatch
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    fn push_event(&mut self, event: MarketEvent) {
        let entry = QueuedEvent {
            ts_ns: event.ts_ns(),
            seq: self.seq,
            event,
        };
        self.seq += 1;
        self.queue.push(Reverse(entry));
    }

    fn reload(&mut self) {
        self.queue.clear();
        self.seq = 0;

        if self.symbols.is_empty() {
            let ticks = self.store.load_ticks(None, self.start, self.end);
            for tick in ticks {
                self.push_event(MarketEvent::Tick(tick));
            }
        } else {
            let symbols = self.symbols.clone();
            for symbol in &symbols {
                let ticks = self.store.load_ticks(Some(symbol), self.start, self.end);
                for tick in ticks {
                    self.push_event(MarketEvent::Tick(tick));
                }
            }
        }

        info!(events = self.queue.len(), "loaded replay queue");
    }
}

impl DataFeed for ReplayFeed {
    fn subscribe(
        &mut self,
        symbols: &[String],
        on_tick: Option<TickCallback>,
        on_bar: Option<BarCallback>,
    ) {
        self.symbols = symbols.to_vec();
        self.on_tick = on_tick;
        self.on_bar = on_bar;
        self.reload();
    }

    fn load_history_bars(&self, _symbol: &str, _start: Ts, _end: Ts, _timeframe: &str) -> Vec<Bar> {
        Vec::new()
    }

    fn load_history_ticks(&self, symbol: &str, start: Ts, end: Ts) -> Vec<Tick> {
        let filter = if symbol.is_empty() { None } else { Some(symbol) };
        self.store.load_ticks(filter, start, end)
    }

    fn run(&mut self) {
        self.control.set_running(true);
        while self.control.is_running() {
            let Some(Reverse(entry)) = self.queue.pop() else {
                break;
            };
            self.control.set_time(Ts::from_nanos(entry.ts_ns));
            match entry.event {
                MarketEvent::Tick(tick) => {
                    if let Some(callback) = self.on_tick.as_mut() {
                        callback(&tick);
                    }
                }
                MarketEvent::Bar(bar) => {
                    if let Some(callback) = self.on_bar.as_mut() {
                        callback(&bar);
                    }
                }
            }
        }
        self.control.set_running(false);
        debug!(pending = self.queue.len(), "replay loop finished");
    }

    fn stop(&self) {
        self.control.stop();
    }

    fn current_time(&self) -> Ts {
        self.control.current_time()
    }

    fn is_live(&self) -> bool {
        false
    }

    fn control(&self) -> Arc<FeedControl> {
        Arc::clone(&self.control)
    }
}
