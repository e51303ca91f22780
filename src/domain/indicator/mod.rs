//! Technical indicators attached to each bar: EMA trend line, RSI momentum
//! and ATR volatility.
//!
//! Every calculation returns one `Option<f64>` per input bar; `None` marks the
//! warm-up period where the indicator is undefined.

pub mod atr;
pub mod ema;
pub mod rsi;

use std::fmt;

use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Ema,
    Rsi,
    Atr,
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Ema => write!(f, "EMA"),
            IndicatorKind::Rsi => write!(f, "RSI"),
            IndicatorKind::Atr => write!(f, "ATR"),
        }
    }
}

/// Lookback periods for the three indicator columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorConfig {
    pub ema_period: usize,
    pub rsi_period: usize,
    pub atr_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            ema_period: 200,
            rsi_period: 3,
            atr_period: 14,
        }
    }
}

/// Compute all three indicators and store them on the bars.
pub fn attach_indicators(bars: &mut [Bar], config: &IndicatorConfig) {
    let ema = ema::calculate_ema(bars, config.ema_period);
    let rsi = rsi::calculate_rsi(bars, config.rsi_period);
    let atr = atr::calculate_atr(bars, config.atr_period);

    for (i, bar) in bars.iter_mut().enumerate() {
        bar.ema = ema[i];
        bar.rsi = rsi[i];
        bar.atr = atr[i];
    }
}

/// Index of the first bar where all three indicators are defined.
pub fn warmup_len(bars: &[Bar]) -> usize {
    bars.iter()
        .position(|b| b.ema.is_some() && b.rsi.is_some() && b.atr.is_some())
        .unwrap_or(bars.len())
}
