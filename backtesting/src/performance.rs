//! One-pass performance reduction over a backtest result

use crate::engine::BacktestResult;
use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-12;

/// Summary statistics of one backtest run
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Balance at the first equity point
    pub initial_balance: f64,
    /// Balance at the last equity point
    pub final_balance: f64,
    /// `final_balance - initial_balance`
    pub net_profit: f64,
    /// Net profit relative to the initial balance
    pub total_return: f64,
    /// Largest peak-to-trough balance loss, absolute
    pub max_drawdown: f64,
    /// Largest peak-to-trough loss relative to the peak
    pub max_drawdown_ratio: f64,
    /// Standard deviation of per-tick simple returns (population)
    pub return_volatility: f64,
    /// Mean return over volatility, scaled by sqrt of the return count;
    /// no risk-free baseline
    pub sharpe_ratio: f64,
    /// Number of recorded order updates
    pub order_count: usize,
    /// Number of executed fills
    pub trade_count: usize,
    /// Total commission across all fills
    pub commission_paid: f64,
}

/// Reduce a result bundle into summary statistics.
///
/// An empty equity curve yields zeros apart from order/trade counts and
/// commissions.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn analyze(result: &BacktestResult) -> PerformanceSummary {
    let mut summary = PerformanceSummary {
        order_count: result.orders.len(),
        trade_count: result.trades.len(),
        ..PerformanceSummary::default()
    };
    summary.commission_paid = result.trades.iter().map(|trade| trade.commission).sum();

    let Some(first) = result.equity_curve.first() else {
        return summary;
    };
    let last = result.equity_curve.last().unwrap_or(first);

    summary.initial_balance = first.balance;
    summary.final_balance = last.balance;
    summary.net_profit = summary.final_balance - summary.initial_balance;
    if summary.initial_balance.abs() > EPSILON {
        summary.total_return = summary.net_profit / summary.initial_balance;
    }

    let mut peak = first.balance;
    let mut returns = Vec::with_capacity(result.equity_curve.len().saturating_sub(1));
    let mut previous: Option<f64> = None;

    for point in &result.equity_curve {
        let balance = point.balance;
        if balance > peak {
            peak = balance;
        }
        let drawdown = peak - balance;
        if drawdown > summary.max_drawdown {
            summary.max_drawdown = drawdown;
        }
        if peak > EPSILON {
            let drawdown_ratio = drawdown / peak;
            if drawdown_ratio > summary.max_drawdown_ratio {
                summary.max_drawdown_ratio = drawdown_ratio;
            }
        }

        if let Some(prev) = previous {
            if prev.abs() > EPSILON {
                returns.push((balance - prev) / prev);
            } else {
                returns.push(0.0);
            }
        }
        previous = Some(balance);
    }

    if !returns.is_empty() {
        let count = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / count;
        let variance = returns
            .iter()
            .map(|value| {
                let diff = value - mean;
                diff * diff
            })
            .sum::<f64>()
            / count;
        summary.return_volatility = variance.sqrt();

        if summary.return_volatility > EPSILON {
            summary.sharpe_ratio = (mean / summary.return_volatility) * count.sqrt();
        }
    }

    summary
}
