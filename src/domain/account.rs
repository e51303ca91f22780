//! Account state owned by a single simulation run.

use chrono::NaiveDateTime;

use super::position::ClosedTrade;
use super::risk::SizeAdjustment;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountState {
    pub cash: f64,
    pub initial_cash: f64,
    pub leverage: f64,
    pub size_multiplier: f64,
    pub total_commission: f64,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl AccountState {
    pub fn new(initial_cash: f64, leverage: f64) -> Self {
        AccountState {
            cash: initial_cash,
            initial_cash,
            leverage,
            size_multiplier: 1.0,
            total_commission: 0.0,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// Realize a closed trade into cash and append it to the ledger.
    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.cash += trade.pnl;
        self.total_commission += trade.commission;
        self.closed_trades.push(trade);
    }

    pub fn record_equity(&mut self, timestamp: NaiveDateTime, equity: f64) {
        self.equity_curve.push(EquityPoint { timestamp, equity });
    }

    pub fn apply_size_adjustment(&mut self, adjustment: SizeAdjustment) {
        match adjustment {
            SizeAdjustment::Unchanged => {}
            SizeAdjustment::Multiply(factor) => self.size_multiplier *= factor,
            SizeAdjustment::Reset => self.size_multiplier = 1.0,
        }
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.cash)
    }
}
