//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are undefined (need n price changes).

use crate::domain::ohlcv::Bar;

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

pub fn calculate_rsi(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    if period == 0 || bars.len() <= period {
        return vec![None; bars.len()];
    }

    let mut values = Vec::with_capacity(bars.len());
    values.push(None);

    let changes: Vec<(f64, f64)> = bars
        .windows(2)
        .map(|w| {
            let change = w[1].close - w[0].close;
            (change.max(0.0), (-change).max(0.0))
        })
        .collect();

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (idx, &(gain, loss)) in changes.iter().enumerate() {
        if idx < period - 1 {
            values.push(None);
        } else if idx == period - 1 {
            avg_gain = changes[..period].iter().map(|c| c.0).sum::<f64>() / period as f64;
            avg_loss = changes[..period].iter().map(|c| c.1).sum::<f64>() / period as f64;
            values.push(Some(rsi_from_averages(avg_gain, avg_loss)));
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
            values.push(Some(rsi_from_averages(avg_gain, avg_loss)));
        }
    }

    values
}
