//! Stop-loss, take-profit and sizing policies.
//!
//! The simulator only talks to [`RiskPolicy`]; each policy decides where the
//! stops go at entry, whether they move while the position is held, and how
//! the next position is sized once a trade closes.

use std::fmt;
use std::str::FromStr;

use super::error::ScalptraderError;
use super::ohlcv::Bar;
use super::position::{ClosedTrade, Direction, Position};

/// Stop levels computed when a position opens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryStops {
    pub stop_loss: f64,
    pub take_profit: Option<f64>,
}

/// Change to the account's sizing multiplier after a trade closes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeAdjustment {
    Unchanged,
    Multiply(f64),
    Reset,
}

pub trait RiskPolicy {
    fn kind(&self) -> PolicyKind;

    /// Stops for a new position, or `None` when they cannot be computed on
    /// this bar (e.g. undefined ATR), in which case no entry is taken.
    fn entry_stops(&self, direction: Direction, entry_price: f64, bar: &Bar) -> Option<EntryStops>;

    /// New stop-loss for a held position after `bar`, if it moves.
    fn on_bar_update(&self, position: &Position, bar: &Bar) -> Option<f64>;

    /// Whether an opposite entry signal closes the position.
    fn exits_on_opposing_signal(&self) -> bool {
        false
    }

    fn on_trade_closed(&mut self, trade: &ClosedTrade) -> SizeAdjustment;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Fixed,
    Volatility,
    Trailing,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 3] = [PolicyKind::Fixed, PolicyKind::Volatility, PolicyKind::Trailing];

    /// Long-form label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            PolicyKind::Fixed => "FixedSLTP_Martingale",
            PolicyKind::Volatility => "ATRBased",
            PolicyKind::Trailing => "TrailingStop_ATR",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Fixed => write!(f, "fixed"),
            PolicyKind::Volatility => write!(f, "volatility"),
            PolicyKind::Trailing => write!(f, "trailing"),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(PolicyKind::Fixed),
            "volatility" | "atr" => Ok(PolicyKind::Volatility),
            "trailing" => Ok(PolicyKind::Trailing),
            other => Err(format!("unknown policy '{}'", other)),
        }
    }
}

/// Parameters for all three policies.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
    /// Fixed stop and target distance in price units (45 pips).
    pub fixed_distance: f64,
    /// Stop distance as a multiple of entry-bar ATR.
    pub volatility_stop_atr: f64,
    /// Target distance as a multiple of the stop distance.
    pub volatility_tp_ratio: f64,
    /// Trailing stop distance as a multiple of current ATR.
    pub trailing_stop_atr: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            fixed_distance: 45e-4,
            volatility_stop_atr: 1.3,
            volatility_tp_ratio: 1.3,
            trailing_stop_atr: 1.5,
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<(), ScalptraderError> {
        let checks = [
            ("fixed", "distance", self.fixed_distance),
            ("volatility", "stop_atr_multiplier", self.volatility_stop_atr),
            ("volatility", "take_profit_ratio", self.volatility_tp_ratio),
            ("trailing", "stop_atr_multiplier", self.trailing_stop_atr),
        ];
        for (section, key, value) in checks {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ScalptraderError::config_invalid(
                    section,
                    key,
                    format!("{} must be positive", key),
                ));
            }
        }
        Ok(())
    }

    /// Fresh policy instance; each run gets its own.
    pub fn build(&self, kind: PolicyKind) -> Box<dyn RiskPolicy + Send> {
        match kind {
            PolicyKind::Fixed => Box::new(FixedPolicy::new(self.fixed_distance)),
            PolicyKind::Volatility => Box::new(VolatilityPolicy::new(
                self.volatility_stop_atr,
                self.volatility_tp_ratio,
            )),
            PolicyKind::Trailing => Box::new(TrailingPolicy::new(self.trailing_stop_atr)),
        }
    }
}

/// Symmetric fixed-distance stops with martingale sizing.
#[derive(Debug, Clone)]
pub struct FixedPolicy {
    distance: f64,
}

impl FixedPolicy {
    pub fn new(distance: f64) -> Self {
        FixedPolicy { distance }
    }
}

impl RiskPolicy for FixedPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Fixed
    }

    fn entry_stops(&self, direction: Direction, entry_price: f64, _bar: &Bar) -> Option<EntryStops> {
        let offset = self.distance * direction.sign();
        Some(EntryStops {
            stop_loss: entry_price - offset,
            take_profit: Some(entry_price + offset),
        })
    }

    fn on_bar_update(&self, _position: &Position, _bar: &Bar) -> Option<f64> {
        None
    }

    fn on_trade_closed(&mut self, trade: &ClosedTrade) -> SizeAdjustment {
        if trade.is_loss() {
            SizeAdjustment::Multiply(2.0)
        } else if trade.is_win() {
            SizeAdjustment::Reset
        } else {
            SizeAdjustment::Unchanged
        }
    }
}

/// ATR-scaled stop and target fixed at entry.
#[derive(Debug, Clone)]
pub struct VolatilityPolicy {
    stop_atr: f64,
    tp_ratio: f64,
}

impl VolatilityPolicy {
    pub fn new(stop_atr: f64, tp_ratio: f64) -> Self {
        VolatilityPolicy { stop_atr, tp_ratio }
    }
}

impl RiskPolicy for VolatilityPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Volatility
    }

    fn entry_stops(&self, direction: Direction, entry_price: f64, bar: &Bar) -> Option<EntryStops> {
        let stop_distance = self.stop_atr * bar.finite_atr()?;
        let sign = direction.sign();
        Some(EntryStops {
            stop_loss: entry_price - stop_distance * sign,
            take_profit: Some(entry_price + stop_distance * self.tp_ratio * sign),
        })
    }

    fn on_bar_update(&self, _position: &Position, _bar: &Bar) -> Option<f64> {
        None
    }

    fn on_trade_closed(&mut self, _trade: &ClosedTrade) -> SizeAdjustment {
        SizeAdjustment::Unchanged
    }
}

/// ATR trailing stop, no target, exits on the opposite signal.
#[derive(Debug, Clone)]
pub struct TrailingPolicy {
    stop_atr: f64,
}

impl TrailingPolicy {
    pub fn new(stop_atr: f64) -> Self {
        TrailingPolicy { stop_atr }
    }
}

impl RiskPolicy for TrailingPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Trailing
    }

    fn entry_stops(&self, direction: Direction, entry_price: f64, bar: &Bar) -> Option<EntryStops> {
        let distance = self.stop_atr * bar.finite_atr()?;
        Some(EntryStops {
            stop_loss: entry_price - distance * direction.sign(),
            take_profit: None,
        })
    }

    fn on_bar_update(&self, position: &Position, bar: &Bar) -> Option<f64> {
        let distance = self.stop_atr * bar.finite_atr()?;
        let candidate = match position.direction {
            Direction::Long => position.stop_loss.max(bar.close - distance),
            Direction::Short => position.stop_loss.min(bar.close + distance),
        };
        (candidate != position.stop_loss).then_some(candidate)
    }

    fn exits_on_opposing_signal(&self) -> bool {
        true
    }

    fn on_trade_closed(&mut self, _trade: &ClosedTrade) -> SizeAdjustment {
        SizeAdjustment::Unchanged
    }
}
