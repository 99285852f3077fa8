//! End-to-end replay: partitions on disk through feed, strategy,
//! broker, engine, and analyzer

use crate::test_utils::*;
use backtesting::{
    BacktestEngine, BacktestResult, SimulatedBroker, Strategy, StrategyContext, analyze,
};
use common::{Tick, Ts};
use feeds::ReplayFeed;
use pretty_assertions::assert_eq;
use rstest::*;
use std::sync::Arc;
use storage::PartitionedTickStore;
use tempfile::TempDir;

const DAY_NS: i64 = 86_400_000_000_000;
const BASE: i64 = 1_704_067_200_000_000_000; // 2024-01-01 00:00:00 UTC

/// Opens two lots on the first tick and closes them on the fourth
struct SwingStrategy {
    ticks_seen: usize,
}

impl SwingStrategy {
    fn new() -> Self {
        Self { ticks_seen: 0 }
    }
}

impl Strategy for SwingStrategy {
    fn on_tick(&mut self, tick: &Tick, ctx: &mut StrategyContext) {
        match self.ticks_seen {
            0 => {
                ctx.buy(&tick.symbol, tick.ask_or_last(), 2)
                    .expect("context is bound");
            }
            3 => {
                ctx.sell(&tick.symbol, tick.bid_or_last(), 2)
                    .expect("context is bound");
            }
            _ => {}
        }
        self.ticks_seen += 1;
    }
}

fn seeded_store(temp: &TempDir) -> anyhow::Result<Arc<PartitionedTickStore>> {
    write_tick_partition(
        temp.path(),
        "2024-01-01",
        "rb2405",
        &[
            (BASE, 3500.0, 10, 3499.0, 3501.0),
            (BASE + 1_000_000_000, 3501.0, 10, 3500.0, 3502.0),
            (BASE + 2_000_000_000, 3502.0, 10, 3501.0, 3503.0),
        ],
    )?;
    write_tick_partition(
        temp.path(),
        "2024-01-02",
        "rb2405",
        &[
            (BASE + DAY_NS, 3510.0, 10, 3509.0, 3511.0),
            (BASE + DAY_NS + 1_000_000_000, 3511.0, 10, 3510.0, 3512.0),
            (BASE + DAY_NS + 2_000_000_000, 3512.0, 10, 3511.0, 3513.0),
        ],
    )?;
    Ok(Arc::new(PartitionedTickStore::new(temp.path())))
}

#[rstest]
fn test_round_trip_realizes_pnl_and_ledger_balances() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let store = seeded_store(&temp)?;
    let feed = ReplayFeed::new(store, Ts::from_sql("2024-01-01")?, Ts::from_sql("2024-01-03")?);

    let mut engine = BacktestEngine::new(feed, SimulatedBroker::default(), SwingStrategy::new());
    engine.run();

    let result = engine.into_result();
    assert_eq!(result.equity_curve.len(), 6);
    assert_eq!(result.trades.len(), 2);
    // New + Filled for the open order and for the close order.
    assert_eq!(result.orders.len(), 4);

    // Open fills at 3501, close at 3509.
    assert_approx_eq(result.trades[0].price, 3501.0, 1e-12);
    assert_approx_eq(result.trades[1].price, 3509.0, 1e-12);

    let open_commission = 3501.0 * 2.0 * 0.0001;
    let close_commission = 3509.0 * 2.0 * 0.0002;
    let realized = (3509.0 - 3501.0) * 2.0;
    let final_balance = result.equity_curve.last().expect("non-empty").balance;
    assert_approx_eq(
        final_balance,
        1_000_000.0 + realized - open_commission - close_commission,
        1e-9,
    );

    // Cash ledger: balance = initial + realized pnl - commissions paid.
    let commissions: f64 = result.trades.iter().map(|trade| trade.commission).sum();
    assert_approx_eq(final_balance, 1_000_000.0 + realized - commissions, 1e-9);
    Ok(())
}

#[rstest]
fn test_summary_reflects_the_replayed_run() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let store = seeded_store(&temp)?;
    let feed = ReplayFeed::new(store, Ts::from_sql("2024-01-01")?, Ts::from_sql("2024-01-03")?);

    let mut engine = BacktestEngine::new(feed, SimulatedBroker::default(), SwingStrategy::new());
    engine.run();
    let result = engine.into_result();
    let summary = analyze(&result);

    assert_eq!(summary.order_count, 4);
    assert_eq!(summary.trade_count, 2);
    assert_approx_eq(
        summary.commission_paid,
        3501.0 * 2.0 * 0.0001 + 3509.0 * 2.0 * 0.0002,
        1e-9,
    );
    assert!(summary.net_profit > 0.0);
    assert!(summary.total_return > 0.0);
    assert!(summary.sharpe_ratio.is_finite());
    assert!(summary.max_drawdown >= 0.0);
    Ok(())
}

#[rstest]
fn test_window_restricts_the_replay() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let store = seeded_store(&temp)?;
    // Only the first trading day falls inside the window.
    let feed = ReplayFeed::new(
        store,
        Ts::from_sql("2024-01-01")?,
        Ts::from_sql("2024-01-01 12:00:00")?,
    );

    let mut engine = BacktestEngine::new(feed, SimulatedBroker::default(), DoNothingStrategy);
    engine.run();

    let result = engine.into_result();
    assert_eq!(result.equity_curve.len(), 3);
    assert!(result.trades.is_empty());
    Ok(())
}

#[rstest]
fn test_result_bundle_serializes() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let store = seeded_store(&temp)?;
    let feed = ReplayFeed::new(store, Ts::from_sql("2024-01-01")?, Ts::from_sql("2024-01-03")?);

    let mut engine = BacktestEngine::new(feed, SimulatedBroker::default(), SwingStrategy::new());
    engine.run();
    let result = engine.into_result();

    let encoded = serde_json::to_string(&result)?;
    let decoded: BacktestResult = serde_json::from_str(&encoded)?;
    assert_eq!(decoded.orders, result.orders);
    assert_eq!(decoded.trades, result.trades);
    assert_eq!(decoded.equity_curve.len(), result.equity_curve.len());
    Ok(())
}

#[rstest]
fn test_history_ticks_match_replayed_events() -> anyhow::Result<()> {
    use feeds::DataFeed;

    let temp = TempDir::new()?;
    let store = seeded_store(&temp)?;
    let feed = ReplayFeed::new(store, Ts::from_sql("2024-01-01")?, Ts::from_sql("2024-01-03")?);

    let ticks = feed.load_history_ticks("rb2405", Ts::from_sql("2024-01-01")?, Ts::from_sql("2024-01-03")?);
    assert_eq!(ticks.len(), 6);
    for window in ticks.windows(2) {
        assert!(window[0].ts_ns <= window[1].ts_ns);
    }
    Ok(())
}
