//! Performance metrics — pure functions that reduce a run to statistics.
//!
//! Every metric is a pure function: trade ledger and/or equity curve in, scalar out.
//! Degenerate inputs (no trades, flat curve, zero variance) yield 0.0, never NaN or ∞.

use serde::{Deserialize, Serialize};
use stratscan_core::Trade;

/// Floor on the summed losing returns when computing the profit factor.
pub const PROFIT_FACTOR_EPSILON: f64 = 1e-9;

/// Periods per year used to annualize the Sharpe ratio.
pub const ANNUALIZATION_PERIODS: f64 = 252.0;

/// Aggregate performance metrics for a single backtest run.
///
/// Ratio fields are fractions (0.12 = 12%). Trade-level averages are taken over
/// per-trade net returns, so every field is invariant to capital scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub win_rate: f64,
    pub sharpe: f64,
    /// Largest peak-to-trough decline, as a positive fraction.
    pub max_drawdown: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl PerformanceMetrics {
    /// Metrics of a run that never traded on a flat curve.
    pub fn empty() -> Self {
        analyze(&[], &[])
    }
}

/// Compute all metrics from a trade ledger and equity curve.
pub fn analyze(trades: &[Trade], equity_curve: &[f64]) -> PerformanceMetrics {
    let returns = trade_returns(trades);
    let wins: Vec<f64> = returns.iter().copied().filter(|r| *r > 0.0).collect();
    let losses: Vec<f64> = trades
        .iter()
        .filter(|t| !t.is_winner())
        .map(Trade::return_pct)
        .collect();

    PerformanceMetrics {
        total_return: total_return(equity_curve),
        win_rate: win_rate(trades),
        sharpe: sharpe_ratio(&returns),
        max_drawdown: max_drawdown(equity_curve),
        profit_factor: profit_factor(trades),
        expectancy: expectancy(trades),
        trade_count: trades.len(),
        winning_trades: trades.iter().filter(|t| t.is_winner()).count(),
        losing_trades: trades.iter().filter(|t| !t.is_winner()).count(),
        avg_win: mean_f64(&wins),
        avg_loss: mean_f64(&losses),
        largest_win: wins.iter().copied().fold(0.0, f64::max),
        largest_loss: losses.iter().copied().fold(0.0, f64::min),
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: final / initial − 1.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    let (Some(&initial), Some(&final_eq)) = (equity_curve.first(), equity_curve.last()) else {
        return 0.0;
    };
    if initial <= 0.0 {
        return 0.0;
    }
    finite_or_zero(final_eq / initial - 1.0)
}

/// Fraction of trades with strictly positive net P&L.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Annualized Sharpe ratio over per-trade returns.
///
/// Sharpe = mean(returns) / std(returns) * sqrt(252), sample standard deviation.
/// Returns 0.0 with fewer than 2 returns or zero variance.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    finite_or_zero(mean_f64(returns) / std * ANNUALIZATION_PERIODS.sqrt())
}

/// Maximum drawdown as a positive fraction (0.15 = 15% decline from peak).
///
/// The running peak is seeded with the first value.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - eq) / peak);
        }
    }
    finite_or_zero(max_dd)
}

/// Gross profit over gross loss, with the loss floored at [`PROFIT_FACTOR_EPSILON`].
///
/// Both sides are sums of per-trade net returns rather than dollar P&L, so
/// position size never moves the ratio.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let returns = trade_returns(trades);
    let gross_profit: f64 = returns.iter().filter(|&&r| r > 0.0).sum();
    let gross_loss: f64 = returns.iter().filter(|&&r| r < 0.0).map(|r| -r).sum();
    if gross_profit <= 0.0 {
        return 0.0;
    }
    finite_or_zero(gross_profit / gross_loss.max(PROFIT_FACTOR_EPSILON))
}

/// Expected net return per trade: win_rate × avg_win + (1 − win_rate) × avg_loss.
pub fn expectancy(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let (wins, losses): (Vec<f64>, Vec<f64>) = trades
        .iter()
        .map(Trade::return_pct)
        .partition(|r| *r > 0.0);
    let wr = win_rate(trades);
    finite_or_zero(wr * mean_f64(&wins) + (1.0 - wr) * mean_f64(&losses))
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Net return of each trade as a fraction of its entry notional.
pub fn trade_returns(trades: &[Trade]) -> Vec<f64> {
    trades.iter().map(Trade::return_pct).collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use stratscan_core::{ExitReason, Side};

    /// A long trade on $10,000 notional with the given net P&L.
    fn make_trade(pnl: f64) -> Trade {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        Trade {
            side: Side::Long,
            entry_index: 0,
            entry_time: t,
            entry_price: 100.0,
            exit_index: 5,
            exit_time: t + chrono::Duration::days(5),
            exit_price: 100.0 + pnl / 100.0,
            quantity: 100.0,
            gross_pnl: pnl,
            fees: 0.0,
            pnl,
            pnl_pct: pnl / 10_000.0,
            bars_held: 5,
            exit_reason: ExitReason::SignalReversal,
        }
    }

    // ── Total return ──

    #[test]
    fn total_return_positive() {
        let eq = vec![100_000.0, 100_500.0, 101_000.0, 110_000.0];
        assert!((total_return(&eq) - 0.1).abs() < 1e-10);
    }

    #[test]
    fn total_return_negative() {
        let eq = vec![100_000.0, 95_000.0, 90_000.0];
        assert!((total_return(&eq) + 0.1).abs() < 1e-10);
    }

    #[test]
    fn total_return_degenerate() {
        assert_eq!(total_return(&[]), 0.0);
        assert_eq!(total_return(&[100_000.0]), 0.0);
        assert_eq!(total_return(&[0.0, 10.0]), 0.0);
    }

    // ── Win rate ──

    #[test]
    fn win_rate_counts_strict_winners() {
        let trades = vec![make_trade(100.0), make_trade(-50.0), make_trade(0.0), make_trade(10.0)];
        assert!((win_rate(&trades) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn win_rate_empty_is_zero() {
        assert_eq!(win_rate(&[]), 0.0);
    }

    // ── Sharpe ──

    #[test]
    fn sharpe_needs_two_trades() {
        assert_eq!(sharpe_ratio(&[]), 0.0);
        assert_eq!(sharpe_ratio(&[0.05]), 0.0);
    }

    #[test]
    fn sharpe_zero_variance_is_zero() {
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01]), 0.0);
    }

    #[test]
    fn sharpe_known_value() {
        // mean 0.02, sample std 0.01 → 2 * sqrt(252)
        let s = sharpe_ratio(&[0.01, 0.02, 0.03]);
        assert!((s - 2.0 * 252.0_f64.sqrt()).abs() < 1e-9, "got {s}");
    }

    #[test]
    fn sharpe_negative_for_losing_trades() {
        assert!(sharpe_ratio(&[-0.01, -0.03, -0.02]) < 0.0);
    }

    // ── Max drawdown ──

    #[test]
    fn max_drawdown_known_value() {
        let eq = vec![100.0, 120.0, 90.0, 110.0, 130.0];
        assert!((max_drawdown(&eq) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_peak_seeded_at_first_value() {
        let eq = vec![100.0, 80.0, 90.0];
        assert!((max_drawdown(&eq) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_monotonic_is_zero() {
        assert_eq!(max_drawdown(&[100.0, 101.0, 102.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    // ── Profit factor ──

    #[test]
    fn profit_factor_known_value() {
        let trades = vec![make_trade(300.0), make_trade(-100.0), make_trade(-50.0)];
        assert!((profit_factor(&trades) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn profit_factor_without_losses_uses_epsilon_floor() {
        // One +0.01% trade over the floor
        let pf = profit_factor(&[make_trade(1.0)]);
        assert!(pf.is_finite());
        assert!((pf - 1e-4 / PROFIT_FACTOR_EPSILON).abs() < 1e-3, "got {pf}");
    }

    #[test]
    fn profit_factor_without_losses_ignores_position_size() {
        let small = vec![make_trade(50.0), make_trade(30.0)];
        let large: Vec<Trade> = small
            .iter()
            .map(|t| Trade {
                quantity: t.quantity * 10.0,
                gross_pnl: t.gross_pnl * 10.0,
                pnl: t.pnl * 10.0,
                ..t.clone()
            })
            .collect();
        assert_eq!(profit_factor(&small), profit_factor(&large));
    }

    #[test]
    fn profit_factor_degenerate() {
        assert_eq!(profit_factor(&[]), 0.0);
        assert_eq!(profit_factor(&[make_trade(-10.0)]), 0.0);
    }

    // ── Expectancy ──

    #[test]
    fn expectancy_known_value() {
        // Returns: +2%, -1% → 0.5 * 0.02 + 0.5 * -0.01 = 0.005
        let trades = vec![make_trade(200.0), make_trade(-100.0)];
        assert!((expectancy(&trades) - 0.005).abs() < 1e-12);
    }

    #[test]
    fn expectancy_empty_is_zero() {
        assert_eq!(expectancy(&[]), 0.0);
    }

    // ── analyze ──

    #[test]
    fn analyze_no_trades() {
        let m = analyze(&[], &[100_000.0; 10]);
        assert_eq!(m.trade_count, 0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.sharpe, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.profit_factor, 0.0);
        assert_eq!(m.expectancy, 0.0);
        assert_eq!(m, PerformanceMetrics::empty());
    }

    #[test]
    fn analyze_trade_statistics() {
        let trades = vec![make_trade(500.0), make_trade(-200.0), make_trade(100.0), make_trade(-400.0)];
        let m = analyze(&trades, &[10_000.0, 10_500.0, 10_300.0, 10_400.0, 10_000.0]);

        assert_eq!(m.trade_count, 4);
        assert_eq!(m.winning_trades, 2);
        assert_eq!(m.losing_trades, 2);
        assert!((m.avg_win - 0.03).abs() < 1e-12);
        assert!((m.avg_loss + 0.03).abs() < 1e-12);
        assert!((m.largest_win - 0.05).abs() < 1e-12);
        assert!((m.largest_loss + 0.04).abs() < 1e-12);
        assert!((m.total_return - 0.0).abs() < 1e-12);
        assert!(m.max_drawdown > 0.0);
    }

    #[test]
    fn metrics_are_scale_invariant() {
        let small = vec![make_trade(50.0), make_trade(-20.0), make_trade(30.0)];
        let large: Vec<Trade> = small
            .iter()
            .map(|t| Trade {
                quantity: t.quantity * 10.0,
                gross_pnl: t.gross_pnl * 10.0,
                pnl: t.pnl * 10.0,
                ..t.clone()
            })
            .collect();
        let curve_small = [10_000.0, 10_050.0, 10_030.0, 10_060.0];
        let curve_large: Vec<f64> = curve_small.iter().map(|v| v * 10.0).collect();

        let a = analyze(&small, &curve_small);
        let b = analyze(&large, &curve_large);
        assert!((a.total_return - b.total_return).abs() < 1e-12);
        assert!((a.sharpe - b.sharpe).abs() < 1e-9);
        assert!((a.max_drawdown - b.max_drawdown).abs() < 1e-12);
        assert!((a.profit_factor - b.profit_factor).abs() < 1e-9);
        assert!((a.expectancy - b.expectancy).abs() < 1e-12);
    }
}
