//! Average True Range with Wilder smoothing.
//!
//! Seed: mean true range of the first n bars (the first bar uses high - low).
//! Then ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n. First (n-1) bars undefined.

use crate::domain::ohlcv::Bar;

pub fn calculate_atr(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    if period == 0 || bars.len() < period {
        return vec![None; bars.len()];
    }

    let tr_values: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut results: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    let mut atr = 0.0;

    for (i, tr) in tr_values.iter().enumerate() {
        if i < period - 1 {
            results.push(None);
        } else if i == period - 1 {
            atr = tr_values[..=i].iter().sum::<f64>() / period as f64;
            results.push(Some(atr));
        } else {
            atr = (atr * (period - 1) as f64 + tr) / period as f64;
            results.push(Some(atr));
        }
    }

    results
}
