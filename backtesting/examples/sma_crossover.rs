//! Simple moving-average crossover strategy replayed over a generated
//! tick partition
//!
//! Run with: `cargo run -p backtesting --example sma_crossover`

use backtesting::{BacktestEngine, SimulatedBroker, Strategy, StrategyContext, analyze};
use common::{Tick, Ts};
use feeds::ReplayFeed;
use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use storage::PartitionedTickStore;
use tracing::info;

/// Buys when the fast average crosses above the slow one, closes the
/// position on the opposite cross.
struct SmaCrossover {
    fast_period: usize,
    slow_period: usize,
    history: VecDeque<f64>,
    holding: i32,
}

impl SmaCrossover {
    fn new(fast_period: usize, slow_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            history: VecDeque::with_capacity(slow_period + 1),
            holding: 0,
        }
    }

    fn average(&self, period: usize) -> Option<f64> {
        if self.history.len() < period {
            return None;
        }
        let sum: f64 = self.history.iter().rev().take(period).sum();
        Some(sum / period as f64)
    }
}

impl Strategy for SmaCrossover {
    fn on_tick(&mut self, tick: &Tick, ctx: &mut StrategyContext) {
        self.history.push_back(tick.last_price);
        if self.history.len() > self.slow_period {
            self.history.pop_front();
        }

        let (Some(fast), Some(slow)) = (self.average(self.fast_period), self.average(self.slow_period))
        else {
            return;
        };

        if fast > slow && self.holding == 0 {
            ctx.buy(&tick.symbol, tick.ask_or_last(), 1).expect("bound");
            self.holding = 1;
        } else if fast < slow && self.holding > 0 {
            ctx.sell(&tick.symbol, tick.bid_or_last(), 1).expect("bound");
            self.holding = 0;
        }
    }
}

/// Write one CSV-backed partition of a slow price wave
fn seed_partition(root: &Path) -> anyhow::Result<()> {
    let dir = root
        .join("source=demo")
        .join("trading_day=2024-01-01")
        .join("instrument_id=rb2405");
    fs::create_dir_all(&dir)?;

    let parquet = dir.join("part-0000.parquet");
    fs::File::create(&parquet)?.write_all(b"PAR1")?;

    let base = Ts::from_sql("2024-01-01")?.as_nanos();
    let mut body = String::from("ts_ns,last_price,last_volume,bid_price1,ask_price1\n");
    for step in 0..240i64 {
        let phase = step as f64 / 40.0;
        let price = 3500.0 + 25.0 * phase.sin() + 0.05 * step as f64;
        body.push_str(&format!(
            "{},{price:.1},2,{:.1},{:.1}\n",
            base + step * 1_000_000_000,
            price - 1.0,
            price + 1.0,
        ));
    }
    fs::write(format!("{}.ticks.csv", parquet.display()), body)?;
    fs::write(
        format!("{}.meta", parquet.display()),
        format!(
            "min_ts_ns={base}\nmax_ts_ns={}\nrow_count=240\n",
            base + 239 * 1_000_000_000
        ),
    )?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let temp = tempfile::TempDir::new()?;
    seed_partition(temp.path())?;

    let store = Arc::new(PartitionedTickStore::new(temp.path()));
    let feed = ReplayFeed::new(
        store,
        Ts::from_sql("2024-01-01")?,
        Ts::from_sql("2024-01-02")?,
    );

    let mut engine = BacktestEngine::new(
        feed,
        SimulatedBroker::default(),
        SmaCrossover::new(5, 20),
    );
    engine.run();

    let result = engine.into_result();
    info!(
        orders = result.orders.len(),
        trades = result.trades.len(),
        "replay finished"
    );

    let summary = analyze(&result);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
