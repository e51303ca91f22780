//! Performance metrics and statistics.

use super::account::{AccountState, EquityPoint};
use super::position::ClosedTrade;
use super::risk::PolicyKind;

pub const DEFAULT_PERIODS_PER_YEAR: f64 = 252.0;

/// Distribution of per-trade returns (net PnL over entry notional).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnDistribution {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub best: f64,
    pub worst: f64,
}

impl ReturnDistribution {
    pub fn from_trades(trades: &[ClosedTrade]) -> Self {
        if trades.is_empty() {
            return ReturnDistribution::default();
        }

        let mut returns: Vec<f64> = trades.iter().map(ClosedTrade::return_pct).collect();
        returns.sort_by(|a, b| a.total_cmp(b));

        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let mid = returns.len() / 2;
        let median = if returns.len() % 2 == 0 {
            (returns[mid - 1] + returns[mid]) / 2.0
        } else {
            returns[mid]
        };

        ReturnDistribution {
            mean,
            median,
            std_dev: variance.sqrt(),
            best: returns[returns.len() - 1],
            worst: returns[0],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub initial_cash: f64,
    pub final_equity: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_trade_duration: f64,
    pub total_commission: f64,
    pub trade_returns: ReturnDistribution,
}

impl Metrics {
    pub fn compute(account: &AccountState, periods_per_year: f64) -> Self {
        let equity_curve = &account.equity_curve;
        let trades = &account.closed_trades;
        let initial_cash = account.initial_cash;
        let final_equity = account.final_equity();

        let total_return = if initial_cash > 0.0 {
            (final_equity - initial_cash) / initial_cash
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(equity_curve, periods_per_year);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_duration = 0usize;

        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                trades_breakeven += 1;
            }
            total_duration += trade.duration_bars();
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        let avg_trade_duration = if total_trades > 0 {
            total_duration as f64 / total_trades as f64
        } else {
            0.0
        };

        Metrics {
            initial_cash,
            final_equity,
            total_return,
            max_drawdown,
            max_drawdown_duration,
            sharpe_ratio,
            sortino_ratio,
            total_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            avg_trade_duration,
            total_commission: account.total_commission,
            trade_returns: ReturnDistribution::from_trades(trades),
        }
    }

    /// Flat metric name → value mapping, in display order.
    pub fn summary(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("Initial Cash", self.initial_cash),
            ("Equity Final", self.final_equity),
            ("Return [%]", self.total_return * 100.0),
            ("Max. Drawdown [%]", self.max_drawdown * 100.0),
            ("Max. Drawdown Duration [bars]", self.max_drawdown_duration as f64),
            ("Sharpe Ratio", self.sharpe_ratio),
            ("Sortino Ratio", self.sortino_ratio),
            ("# Trades", self.total_trades as f64),
            ("# Won", self.trades_won as f64),
            ("# Lost", self.trades_lost as f64),
            ("# Breakeven", self.trades_breakeven as f64),
            ("Win Rate [%]", self.win_rate * 100.0),
            ("Profit Factor", self.profit_factor),
            ("Avg. Win", self.avg_win),
            ("Avg. Loss", self.avg_loss),
            ("Largest Win", self.largest_win),
            ("Largest Loss", self.largest_loss),
            ("Avg. Trade Duration [bars]", self.avg_trade_duration),
            ("Commissions", self.total_commission),
            ("Avg. Trade [%]", self.trade_returns.mean * 100.0),
            ("Median Trade [%]", self.trade_returns.median * 100.0),
            ("Trade StdDev [%]", self.trade_returns.std_dev * 100.0),
            ("Best Trade [%]", self.trade_returns.best * 100.0),
            ("Worst Trade [%]", self.trade_returns.worst * 100.0),
        ]
    }
}

/// One row of the cross-policy comparison table.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub policy: PolicyKind,
    pub return_pct: f64,
    pub max_drawdown_pct: f64,
    pub trades: usize,
    pub win_rate_pct: f64,
}

impl ComparisonRow {
    pub fn new(policy: PolicyKind, metrics: &Metrics) -> Self {
        ComparisonRow {
            policy,
            return_pct: metrics.total_return * 100.0,
            max_drawdown_pct: metrics.max_drawdown * 100.0,
            trades: metrics.total_trades,
            win_rate_pct: metrics.win_rate * 100.0,
        }
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    if equity_curve.is_empty() {
        return (0.0, 0);
    }

    let mut peak = equity_curve[0].equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            max_dd = max_dd.max(dd);
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint], periods_per_year: f64) -> (f64, f64) {
    if equity_curve.len() < 2 {
        return (0.0, 0.0);
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            let curr = w[1].equity;
            if prev > 0.0 { (curr - prev) / prev } else { 0.0 }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    let scale = periods_per_year.sqrt();

    let sharpe = if stddev > 0.0 { mean / stddev * scale } else { 0.0 };

    let downside: f64 = returns.iter().filter(|&&r| r < 0.0).map(|r| r.powi(2)).sum();
    let downside_stddev = (downside / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        mean / downside_stddev * scale
    } else {
        0.0
    };

    (sharpe, sortino)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{Direction, ExitReason};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::minutes(5 * i as i64)
    }

    fn make_equity_curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &equity)| EquityPoint { timestamp: ts(i), equity })
            .collect()
    }

    fn make_account(equity: &[f64], trades: Vec<ClosedTrade>) -> AccountState {
        let initial = equity.first().copied().unwrap_or(100.0);
        let mut account = AccountState::new(initial, 0.02);
        for trade in trades {
            account.record_trade(trade);
        }
        account.equity_curve = make_equity_curve(equity);
        account
    }

    fn make_trade(pnl: f64, bars: usize) -> ClosedTrade {
        ClosedTrade {
            direction: Direction::Long,
            entry_price: 1.0,
            exit_price: 1.0 + pnl / 10.0,
            entry_index: 0,
            exit_index: bars,
            entry_time: ts(0),
            exit_time: ts(bars),
            size: 10.0,
            gross_pnl: pnl,
            commission: 0.0,
            pnl,
            exit_reason: ExitReason::TakeProfit,
        }
    }

    #[test]
    fn metrics_empty_account() {
        let account = AccountState::new(100.0, 0.02);
        let metrics = Metrics::compute(&account, DEFAULT_PERIODS_PER_YEAR);
        assert_eq!(metrics.total_return, 0.0);
        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.trade_returns, ReturnDistribution::default());
    }

    #[test]
    fn metrics_total_return() {
        let up = Metrics::compute(&make_account(&[100.0, 110.0], vec![]), 252.0);
        assert!((up.total_return - 0.10).abs() < 1e-9);
        let down = Metrics::compute(&make_account(&[100.0, 90.0], vec![]), 252.0);
        assert!((down.total_return + 0.10).abs() < 1e-9);
    }

    #[test]
    fn metrics_trade_stats_wins_and_losses() {
        let trades = vec![
            make_trade(1.0, 5),
            make_trade(-0.5, 3),
            make_trade(2.0, 10),
            make_trade(0.0, 1),
        ];
        let metrics = Metrics::compute(&make_account(&[100.0, 102.5], trades), 252.0);

        assert_eq!(metrics.total_trades, 4);
        assert_eq!(metrics.trades_won, 2);
        assert_eq!(metrics.trades_lost, 1);
        assert_eq!(metrics.trades_breakeven, 1);
        assert!((metrics.win_rate - 0.5).abs() < f64::EPSILON);
        assert!((metrics.profit_factor - 6.0).abs() < 1e-9);
        assert!((metrics.avg_trade_duration - 4.75).abs() < 1e-9);
    }

    #[test]
    fn metrics_avg_and_largest() {
        let trades = vec![
            make_trade(1.0, 5),
            make_trade(-0.6, 3),
            make_trade(3.0, 10),
            make_trade(-1.5, 2),
        ];
        let metrics = Metrics::compute(&make_account(&[100.0, 101.9], trades), 252.0);

        assert!((metrics.avg_win - 2.0).abs() < 1e-9);
        assert!((metrics.avg_loss - 1.05).abs() < 1e-9);
        assert!((metrics.largest_win - 3.0).abs() < 1e-9);
        assert!((metrics.largest_loss - 1.5).abs() < 1e-9);

        // Loss magnitudes are reported unsigned, next to "Avg. Loss".
        let summary = metrics.summary();
        let get = |name: &str| summary.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);
        assert_eq!(get("Largest Win"), Some(3.0));
        assert_eq!(get("Largest Loss"), Some(1.5));
        assert_eq!(get("Worst Trade"), None);
    }

    #[test]
    fn profit_factor_without_losses_is_infinite() {
        let metrics = Metrics::compute(&make_account(&[100.0, 101.0], vec![make_trade(1.0, 2)]), 252.0);
        assert!(metrics.profit_factor.is_infinite());
    }

    #[test]
    fn max_drawdown() {
        let curve = make_equity_curve(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]);
        let (dd, _) = compute_drawdown(&curve);
        assert!((dd - (110.0 - 80.0) / 110.0).abs() < 1e-9);
    }

    #[test]
    fn max_drawdown_duration() {
        let curve = make_equity_curve(&[100.0, 110.0, 100.0, 90.0, 85.0, 95.0]);
        let (_, duration) = compute_drawdown(&curve);
        assert_eq!(duration, 4);
    }

    #[test]
    fn sharpe_positive_for_rising_curve() {
        let values: Vec<f64> = (0..50).map(|i| 100.0 * (1.0 + 0.001 * i as f64)).collect();
        let metrics = Metrics::compute(&make_account(&values, vec![]), 252.0);
        assert!(metrics.sharpe_ratio > 0.0);
        assert_eq!(metrics.sortino_ratio, 0.0);
    }

    #[test]
    fn sortino_finite_with_losses() {
        let curve = make_equity_curve(&[100.0, 101.0, 100.5, 101.5, 100.0, 102.0]);
        let (sharpe, sortino) = compute_risk_adjusted(&curve, 252.0);
        assert!(sharpe.is_finite());
        assert!(sortino.is_finite() && sortino > 0.0);
    }

    #[test]
    fn return_distribution() {
        // notional 10.0 per trade
        let trades = vec![make_trade(1.0, 1), make_trade(-0.5, 1), make_trade(2.0, 1)];
        let dist = ReturnDistribution::from_trades(&trades);
        assert!((dist.mean - 0.25 / 3.0).abs() < 1e-9);
        assert!((dist.median - 0.1).abs() < 1e-9);
        assert!((dist.best - 0.2).abs() < 1e-9);
        assert!((dist.worst + 0.05).abs() < 1e-9);
        assert!(dist.std_dev > 0.0);
    }

    #[test]
    fn summary_and_comparison_row() {
        let trades = vec![make_trade(1.0, 2), make_trade(-1.0, 2)];
        let metrics = Metrics::compute(&make_account(&[100.0, 100.0], trades), 252.0);
        let summary = metrics.summary();
        assert_eq!(summary[0].0, "Initial Cash");
        let win_rate = summary.iter().find(|(k, _)| *k == "Win Rate [%]").unwrap().1;
        assert!((win_rate - 50.0).abs() < 1e-9);

        let row = ComparisonRow::new(PolicyKind::Fixed, &metrics);
        assert_eq!(row.trades, 2);
        assert!((row.win_rate_pct - 50.0).abs() < 1e-9);
        assert_eq!(row.return_pct, 0.0);
    }
}
