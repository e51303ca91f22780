#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use scalptrader::domain::error::ScalptraderError;
pub use scalptrader::domain::ohlcv::Bar;
use scalptrader::ports::data_port::DataPort;

/// Five-minute bar timestamps starting 2024-01-15 00:00.
pub fn ts(index: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::minutes(5 * index as i64)
}

pub fn make_bar(index: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar::new(ts(index), open, high, low, close, 1_000.0)
}

/// Bars where open = high = low = close = price.
pub fn flat_bars(n: usize, price: f64) -> Vec<Bar> {
    (0..n).map(|i| make_bar(i, price, price, price, price)).collect()
}

/// Bars with a ±`half_range` band around `price` and every indicator set.
pub fn banded_bars(n: usize, price: f64, half_range: f64, ema: f64, rsi: f64, atr: f64) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let mut b = make_bar(i, price, price + half_range, price - half_range, price);
            b.ema = Some(ema);
            b.rsi = Some(rsi);
            b.atr = Some(atr);
            b
        })
        .collect()
}

/// Deterministic zig-zag closes with a slow drift, suitable for the full
/// indicator pipeline.
pub fn zigzag_bars(n: usize, start: f64, drift: f64) -> Vec<Bar> {
    let mut price = start;
    (0..n)
        .map(|i| {
            let step = if i % 3 == 0 { -0.0008 } else { 0.0006 };
            let open = price;
            price += step + drift;
            let close = price;
            make_bar(
                i,
                open,
                open.max(close) + 0.0003,
                open.min(close) - 0.0003,
                close,
            )
        })
        .collect()
}

pub fn write_bars_csv(path: &std::path::Path, bars: &[Bar]) {
    let mut content = String::from("time,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    std::fs::write(path, content).unwrap();
}

pub struct MockDataPort {
    pub bars: Vec<Bar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            bars: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self) -> Result<Vec<Bar>, ScalptraderError> {
        if let Some(reason) = &self.error {
            return Err(ScalptraderError::DataLoad {
                reason: reason.clone(),
            });
        }
        Ok(self.bars.clone())
    }
}
