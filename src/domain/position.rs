//! Open position and closed trade records.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    OpposingSignal,
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::TakeProfit => write!(f, "take_profit"),
            ExitReason::OpposingSignal => write!(f, "opposing_signal"),
            ExitReason::EndOfData => write!(f, "end_of_data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub size: f64,
    pub stop_loss: f64,
    pub take_profit: Option<f64>,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    pub fn is_short(&self) -> bool {
        self.direction == Direction::Short
    }

    pub fn notional(&self, price: f64) -> f64 {
        self.size * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.size * self.direction.sign()
    }

    /// True when the bar range reaches the stop.
    pub fn stop_touched(&self, low: f64, high: f64) -> bool {
        if self.is_long() {
            low <= self.stop_loss
        } else {
            high >= self.stop_loss
        }
    }

    /// True when the bar range reaches the target. Always false without one.
    pub fn target_touched(&self, low: f64, high: f64) -> bool {
        match self.take_profit {
            None => false,
            Some(tp) if self.is_long() => high >= tp,
            Some(tp) => low <= tp,
        }
    }

    /// Fill price for a level reached inside the bar; a gap through the level
    /// fills at the open.
    pub fn fill_price(&self, level: f64, open: f64, reason: ExitReason) -> f64 {
        let adverse = reason == ExitReason::StopLoss;
        let gapped = match (self.direction, adverse) {
            (Direction::Long, true) | (Direction::Short, false) => open < level,
            (Direction::Long, false) | (Direction::Short, true) => open > level,
        };
        if gapped { open } else { level }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub size: f64,
    pub gross_pnl: f64,
    pub commission: f64,
    pub pnl: f64,
    pub exit_reason: ExitReason,
}

impl ClosedTrade {
    /// Net profit relative to the entry notional.
    pub fn return_pct(&self) -> f64 {
        let notional = self.entry_price * self.size;
        if notional > 0.0 { self.pnl / notional } else { 0.0 }
    }

    pub fn duration_bars(&self) -> usize {
        self.exit_index - self.entry_index
    }

    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.pnl < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn sample_long_position() -> Position {
        Position {
            direction: Direction::Long,
            entry_price: 50.0,
            entry_index: 3,
            entry_time: ts(),
            size: 100.0,
            stop_loss: 45.0,
            take_profit: Some(60.0),
        }
    }

    fn sample_short_position() -> Position {
        Position {
            direction: Direction::Short,
            entry_price: 100.0,
            entry_index: 3,
            entry_time: ts(),
            size: 100.0,
            stop_loss: 110.0,
            take_profit: Some(80.0),
        }
    }

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Long.sign(), 1.0);
        assert_eq!(Direction::Short.sign(), -1.0);
    }

    #[test]
    fn is_long_and_short() {
        assert!(sample_long_position().is_long());
        assert!(sample_short_position().is_short());
    }

    #[test]
    fn unrealized_pnl_long() {
        let pos = sample_long_position();
        assert!((pos.unrealized_pnl(55.0) - 500.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(45.0) + 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrealized_pnl_short() {
        let pos = sample_short_position();
        assert!((pos.unrealized_pnl(90.0) - 1000.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(110.0) + 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stop_touched_long() {
        let pos = sample_long_position();
        assert!(pos.stop_touched(44.0, 50.0));
        assert!(pos.stop_touched(45.0, 50.0));
        assert!(!pos.stop_touched(46.0, 50.0));
    }

    #[test]
    fn stop_touched_short() {
        let pos = sample_short_position();
        assert!(pos.stop_touched(100.0, 111.0));
        assert!(pos.stop_touched(100.0, 110.0));
        assert!(!pos.stop_touched(100.0, 109.0));
    }

    #[test]
    fn target_touched() {
        let long = sample_long_position();
        assert!(long.target_touched(50.0, 60.0));
        assert!(!long.target_touched(50.0, 59.0));

        let short = sample_short_position();
        assert!(short.target_touched(80.0, 100.0));
        assert!(!short.target_touched(81.0, 100.0));
    }

    #[test]
    fn no_target_never_touched() {
        let mut pos = sample_long_position();
        pos.take_profit = None;
        assert!(!pos.target_touched(0.0, 1_000_000.0));
    }

    #[test]
    fn fill_price_at_level_or_gap_open() {
        let long = sample_long_position();
        assert_eq!(long.fill_price(45.0, 47.0, ExitReason::StopLoss), 45.0);
        assert_eq!(long.fill_price(45.0, 43.0, ExitReason::StopLoss), 43.0);
        assert_eq!(long.fill_price(60.0, 58.0, ExitReason::TakeProfit), 60.0);
        assert_eq!(long.fill_price(60.0, 62.0, ExitReason::TakeProfit), 62.0);

        let short = sample_short_position();
        assert_eq!(short.fill_price(110.0, 112.0, ExitReason::StopLoss), 112.0);
        assert_eq!(short.fill_price(80.0, 78.0, ExitReason::TakeProfit), 78.0);
        assert_eq!(short.fill_price(80.0, 85.0, ExitReason::TakeProfit), 80.0);
    }

    #[test]
    fn closed_trade_helpers() {
        let trade = ClosedTrade {
            direction: Direction::Long,
            entry_price: 50.0,
            exit_price: 55.0,
            entry_index: 2,
            exit_index: 7,
            entry_time: ts(),
            exit_time: ts(),
            size: 10.0,
            gross_pnl: 50.0,
            commission: 0.0,
            pnl: 50.0,
            exit_reason: ExitReason::TakeProfit,
        };
        assert!((trade.return_pct() - 0.1).abs() < 1e-12);
        assert_eq!(trade.duration_bars(), 5);
        assert!(trade.is_win());
        assert!(!trade.is_loss());
    }

    #[test]
    fn exit_reason_display() {
        assert_eq!(ExitReason::EndOfData.to_string(), "end_of_data");
        assert_eq!(ExitReason::OpposingSignal.to_string(), "opposing_signal");
    }
}
