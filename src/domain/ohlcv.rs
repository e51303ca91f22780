//! OHLCV bar representation and the validated bar series.

use chrono::NaiveDateTime;

use super::error::ScalptraderError;
use super::indicator::{self, IndicatorConfig, IndicatorKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub ema: Option<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
}

impl Bar {
    pub fn new(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            ema: None,
            rsi: None,
            atr: None,
        }
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn indicator(&self, kind: IndicatorKind) -> Option<f64> {
        match kind {
            IndicatorKind::Ema => self.ema,
            IndicatorKind::Rsi => self.rsi,
            IndicatorKind::Atr => self.atr,
        }
    }

    /// ATR when defined and finite; NaN or infinite counts as undefined.
    pub fn finite_atr(&self) -> Option<f64> {
        self.atr.filter(|a| a.is_finite())
    }
}

/// Ordered, validated bars. Immutable once built apart from indicator attachment.
#[derive(Debug, Clone)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self, ScalptraderError> {
        if bars.is_empty() {
            return Err(ScalptraderError::EmptySeries);
        }

        for (index, bar) in bars.iter().enumerate() {
            let prices = [bar.open, bar.high, bar.low, bar.close];
            if prices.iter().any(|p| !p.is_finite()) {
                return Err(ScalptraderError::InvalidBar {
                    index,
                    reason: "non-finite price".into(),
                });
            }
            if bar.high < bar.low {
                return Err(ScalptraderError::InvalidBar {
                    index,
                    reason: format!("high {} below low {}", bar.high, bar.low),
                });
            }
            if bar.volume.is_nan() || bar.volume <= 0.0 {
                return Err(ScalptraderError::InvalidBar {
                    index,
                    reason: "volume must be positive".into(),
                });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(ScalptraderError::NonMonotonicTimestamp { index });
            }
        }

        Ok(BarSeries { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> &Bar {
        &self.bars[0]
    }

    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    /// Keep only the first `max_bars` bars. Zero keeps everything.
    pub fn truncate(mut self, max_bars: usize) -> Self {
        if max_bars > 0 && max_bars < self.bars.len() {
            self.bars.truncate(max_bars);
        }
        self
    }

    /// Fill the EMA, RSI and ATR columns, replacing any existing values.
    pub fn with_indicators(mut self, config: &IndicatorConfig) -> Self {
        indicator::attach_indicators(&mut self.bars, config);
        self
    }

    /// Fails when no bar carries a value for `kind`.
    pub fn ensure_indicator(&self, kind: IndicatorKind) -> Result<(), ScalptraderError> {
        if self.bars.iter().any(|b| b.indicator(kind).is_some()) {
            Ok(())
        } else {
            Err(ScalptraderError::MissingIndicator {
                indicator: kind.to_string(),
            })
        }
    }
}
