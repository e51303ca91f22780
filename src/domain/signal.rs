//! Entry signals: trend filter combined with momentum extremes.

use std::fmt;

use super::ohlcv::Bar;
use super::trend::TrendState;
use crate::domain::error::ScalptraderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signal {
    #[default]
    None,
    Buy,
    Sell,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::None => write!(f, "NONE"),
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
        }
    }
}

/// Momentum levels on the 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            oversold: 10.0,
            overbought: 90.0,
        }
    }
}

impl Thresholds {
    pub fn new(oversold: f64, overbought: f64) -> Result<Self, ScalptraderError> {
        if !(0.0..=100.0).contains(&oversold) {
            return Err(ScalptraderError::config_invalid(
                "signal",
                "oversold",
                "oversold must be between 0 and 100",
            ));
        }
        if !(0.0..=100.0).contains(&overbought) {
            return Err(ScalptraderError::config_invalid(
                "signal",
                "overbought",
                "overbought must be between 0 and 100",
            ));
        }
        if oversold >= overbought {
            return Err(ScalptraderError::config_invalid(
                "signal",
                "oversold",
                "oversold must be below overbought",
            ));
        }
        Ok(Thresholds {
            oversold,
            overbought,
        })
    }

    fn signal_for(&self, trend: TrendState, momentum: Option<f64>) -> Signal {
        let Some(m) = momentum.filter(|m| m.is_finite()) else {
            return Signal::None;
        };
        match trend {
            TrendState::StrongDown if m >= self.overbought => Signal::Sell,
            TrendState::StrongUp if m <= self.oversold => Signal::Buy,
            _ => Signal::None,
        }
    }
}

/// One signal per bar from a momentum series and the trend states.
///
/// Inputs of unequal length are evaluated up to the shorter one.
pub fn generate(momentum: &[Option<f64>], trends: &[TrendState], thresholds: &Thresholds) -> Vec<Signal> {
    momentum
        .iter()
        .zip(trends)
        .map(|(m, t)| thresholds.signal_for(*t, *m))
        .collect()
}

/// Signals using each bar's RSI as the momentum source.
pub fn generate_for_bars(bars: &[Bar], trends: &[TrendState], thresholds: &Thresholds) -> Vec<Signal> {
    let momentum: Vec<Option<f64>> = bars.iter().map(|b| b.rsi).collect();
    generate(&momentum, trends, thresholds)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalCounts {
    pub buy: usize,
    pub sell: usize,
}

impl SignalCounts {
    pub fn tally(signals: &[Signal]) -> Self {
        signals.iter().fold(SignalCounts::default(), |mut acc, s| {
            match s {
                Signal::Buy => acc.buy += 1,
                Signal::Sell => acc.sell += 1,
                Signal::None => {}
            }
            acc
        })
    }
}
