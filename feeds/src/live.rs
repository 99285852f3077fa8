//! Blocking live-feed stub
//!
//! Satisfies the common feed interface for wiring that expects a live
//! source. `run` parks the caller until `stop`; no data is delivered.

use crate::{BarCallback, DataFeed, FeedControl, TickCallback};
use common::{Bar, Tick, Ts};
use std::sync::Arc;
use tracing::info;

/// Live market data feed placeholder
pub struct LiveFeed {
    control: Arc<FeedControl>,
    on_tick: Option<TickCallback>,
    on_bar: Option<BarCallback>,
}

impl LiveFeed {
    /// Create a live feed ready to run
    #[must_use]
    pub fn new() -> Self {
        let control = Arc::new(FeedControl::new(Ts::now()));
        control.set_running(true);
        Self {
            control,
            on_tick: None,
            on_bar: None,
        }
    }
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveFeed {
    /// Whether tick or bar subscribers are installed
    #[must_use]
    pub fn has_subscribers(&self) -> bool {
        self.on_tick.is_some() || self.on_bar.is_some()
    }
}

impl DataFeed for LiveFeed {
    fn subscribe(
        &mut self,
        symbols: &[String],
        on_tick: Option<TickCallback>,
        on_bar: Option<BarCallback>,
    ) {
        info!(symbols = symbols.len(), "live feed subscription replaced");
        self.on_tick = on_tick;
        self.on_bar = on_bar;
    }

    fn load_history_bars(&self, _symbol: &str, _start: Ts, _end: Ts, _timeframe: &str) -> Vec<Bar> {
        Vec::new()
    }

    fn load_history_ticks(&self, _symbol: &str, _start: Ts, _end: Ts) -> Vec<Tick> {
        Vec::new()
    }

    fn run(&mut self) {
        self.control.wait_until_stopped();
    }

    fn stop(&self) {
        self.control.stop();
    }

    fn current_time(&self) -> Ts {
        Ts::now()
    }

    fn is_live(&self) -> bool {
        true
    }

    fn control(&self) -> Arc<FeedControl> {
        Arc::clone(&self.control)
    }
}
