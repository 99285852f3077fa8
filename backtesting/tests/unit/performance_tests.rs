//! Unit tests for the performance analyzer

use crate::test_utils::assert_approx_eq;
use backtesting::{BacktestResult, EquityPoint, analyze};
use common::{OffsetFlag, OrderType, Side, Trade, Ts};
use rstest::*;

fn curve(balances: &[f64]) -> BacktestResult {
    let mut result = BacktestResult::default();
    for (index, balance) in balances.iter().enumerate() {
        result.equity_curve.push(EquityPoint {
            time: Ts::from_nanos(index as i64 + 1),
            balance: *balance,
        });
    }
    result
}

fn trade_with_commission(commission: f64) -> Trade {
    Trade {
        trade_id: "trd-1".to_string(),
        order_id: "ord-1".to_string(),
        account_id: "sim-account".to_string(),
        strategy_id: "strategy".to_string(),
        symbol: "rb2405".to_string(),
        exchange: String::new(),
        side: Side::Buy,
        offset: OffsetFlag::Open,
        price: 100.0,
        quantity: 1,
        trade_ts_ns: 1,
        commission,
    }
}

#[rstest]
fn test_core_metrics_on_known_curve() {
    let mut result = curve(&[1_000.0, 1_100.0, 990.0, 1_210.0]);
    result.trades.push(trade_with_commission(1.5));
    result.trades.push(trade_with_commission(0.5));

    let summary = analyze(&result);
    assert_approx_eq(summary.initial_balance, 1_000.0, 1e-12);
    assert_approx_eq(summary.final_balance, 1_210.0, 1e-12);
    assert_approx_eq(summary.net_profit, 210.0, 1e-12);
    assert_approx_eq(summary.total_return, 0.21, 1e-12);
    assert_approx_eq(summary.max_drawdown, 110.0, 1e-12);
    assert_approx_eq(summary.max_drawdown_ratio, 0.1, 1e-12);
    // Population deviation of [0.1, -0.1, 0.2222...], Sharpe scaled by
    // sqrt(3).
    assert_approx_eq(summary.return_volatility, 0.132_817_933_904, 1e-9);
    assert_approx_eq(summary.sharpe_ratio, 0.965_984_457_435, 1e-9);
    assert_eq!(summary.trade_count, 2);
    assert_approx_eq(summary.commission_paid, 2.0, 1e-12);
}

#[rstest]
fn test_empty_result_is_all_zeros() {
    let summary = analyze(&BacktestResult::default());
    assert_eq!(summary, backtesting::PerformanceSummary::default());
}

#[rstest]
fn test_counts_and_commissions_survive_empty_curve() {
    let mut result = BacktestResult::default();
    result.trades.push(trade_with_commission(1.25));
    let summary = analyze(&result);
    assert_eq!(summary.trade_count, 1);
    assert_approx_eq(summary.commission_paid, 1.25, 1e-12);
    assert_approx_eq(summary.total_return, 0.0, 1e-12);
    assert_approx_eq(summary.sharpe_ratio, 0.0, 1e-12);
}

#[rstest]
fn test_flat_curve_has_no_volatility_or_drawdown() {
    let summary = analyze(&curve(&[1_000.0, 1_000.0, 1_000.0]));
    assert_approx_eq(summary.return_volatility, 0.0, 1e-12);
    assert_approx_eq(summary.sharpe_ratio, 0.0, 1e-12);
    assert_approx_eq(summary.max_drawdown, 0.0, 1e-12);
    assert_approx_eq(summary.max_drawdown_ratio, 0.0, 1e-12);
}

#[rstest]
fn test_single_point_curve() {
    let summary = analyze(&curve(&[500.0]));
    assert_approx_eq(summary.initial_balance, 500.0, 1e-12);
    assert_approx_eq(summary.final_balance, 500.0, 1e-12);
    assert_approx_eq(summary.net_profit, 0.0, 1e-12);
    assert_approx_eq(summary.return_volatility, 0.0, 1e-12);
}

#[rstest]
fn test_zero_balances_do_not_divide() {
    let summary = analyze(&curve(&[0.0, 10.0, 0.0]));
    // Initial balance of zero keeps total_return at zero, and the
    // return out of a zero balance is recorded as zero.
    assert_approx_eq(summary.total_return, 0.0, 1e-12);
    assert!(summary.sharpe_ratio.is_finite());
    assert!(summary.return_volatility.is_finite());
}

#[rstest]
fn test_monotone_rising_curve_has_zero_drawdown() {
    let summary = analyze(&curve(&[100.0, 110.0, 125.0, 150.0]));
    assert_approx_eq(summary.max_drawdown, 0.0, 1e-12);
    assert!(summary.sharpe_ratio > 0.0);
    assert!(summary.total_return > 0.0);
}

#[rstest]
fn test_order_type_is_not_required_for_analysis() {
    // Orders contribute only their count.
    let mut result = curve(&[100.0, 101.0]);
    result.orders.push(common::Order {
        order_id: "ord-1".to_string(),
        account_id: "sim-account".to_string(),
        client_order_id: "cid-1".to_string(),
        strategy_id: "strategy".to_string(),
        symbol: "rb2405".to_string(),
        exchange: String::new(),
        side: Side::Buy,
        offset: OffsetFlag::Open,
        order_type: OrderType::Limit,
        price: 100.0,
        quantity: 1,
        filled_quantity: 1,
        avg_fill_price: 100.0,
        status: common::OrderStatus::Filled,
        created_at_ns: 1,
        updated_at_ns: 1,
        trace_id: "trace".to_string(),
    });
    let summary = analyze(&result);
    assert_eq!(summary.order_count, 1);
}
