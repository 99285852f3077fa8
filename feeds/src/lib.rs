//! Market data feeds
//!
//! Organized structure:
//! - replay: deterministic replay over the partitioned tick store
//! - live: blocking stub satisfying the common feed interface
//! - `FeedControl`: shared run-flag and clock visible to strategy handles

#![deny(warnings)]
#![deny(clippy::all)]

use common::{Bar, Tick, Ts};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

pub mod live;
pub mod replay;

pub use live::LiveFeed;
pub use replay::ReplayFeed;

/// Callback invoked for every dispatched tick
pub type TickCallback = Box<dyn FnMut(&Tick)>;
/// Callback invoked for every dispatched bar
pub type BarCallback = Box<dyn FnMut(&Bar)>;

/// Event delivered by a feed, ordered by timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarketEvent {
    /// Level-1 tick
    Tick(Tick),
    /// Aggregated bar
    Bar(Bar),
}

impl MarketEvent {
    /// Event timestamp in nanoseconds since epoch
    #[must_use]
    pub fn ts_ns(&self) -> i64 {
        match self {
            Self::Tick(tick) => tick.ts_ns,
            Self::Bar(bar) => bar.ts_ns,
        }
    }
}

/// Common capability set of replay and live feeds
pub trait DataFeed {
    /// Replace the subscription: symbols of interest (empty = all) and
    /// the per-event callbacks
    fn subscribe(
        &mut self,
        symbols: &[String],
        on_tick: Option<TickCallback>,
        on_bar: Option<BarCallback>,
    );

    /// Historical bars for `symbol` within `[start, end]`
    fn load_history_bars(&self, symbol: &str, start: Ts, end: Ts, timeframe: &str) -> Vec<Bar>;

    /// Historical ticks for `symbol` within `[start, end]`
    fn load_history_ticks(&self, symbol: &str, start: Ts, end: Ts) -> Vec<Tick>;

    /// Dispatch events until exhausted or stopped
    fn run(&mut self);

    /// Request cooperative termination; honored before the next dispatch
    fn stop(&self);

    /// Timestamp of the last dispatched event
    fn current_time(&self) -> Ts;

    /// Whether this feed delivers live (non-replayed) data
    fn is_live(&self) -> bool;

    /// Shared run-flag and clock, safe to hold across the run loop
    fn control(&self) -> Arc<FeedControl>;
}

/// Run-flag and clock shared between a feed and its consumers
///
/// The flag is atomic so `stop` may be called from a dispatch callback or
/// from another thread; the wait/notify pair only serves the blocking
/// live feed.
#[derive(Debug)]
pub struct FeedControl {
    running: AtomicBool,
    now_ns: AtomicI64,
    lock: Mutex<()>,
    signal: Condvar,
}

impl FeedControl {
    /// Create a control starting at `start` with the run flag clear
    #[must_use]
    pub fn new(start: Ts) -> Self {
        Self {
            running: AtomicBool::new(false),
            now_ns: AtomicI64::new(start.as_nanos()),
            lock: Mutex::new(()),
            signal: Condvar::new(),
        }
    }

    /// Whether the owning feed is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Clear the run flag and wake any blocked `run`
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        let _guard = self.lock.lock();
        self.signal.notify_all();
    }

    /// Timestamp of the last dispatched event
    #[must_use]
    pub fn current_time(&self) -> Ts {
        Ts::from_nanos(self.now_ns.load(Ordering::Acquire))
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub(crate) fn set_time(&self, time: Ts) {
        self.now_ns.store(time.as_nanos(), Ordering::Release);
    }

    pub(crate) fn wait_until_stopped(&self) {
        let mut guard = self.lock.lock();
        while self.is_running() {
            self.signal.wait(&mut guard);
        }
    }
}
