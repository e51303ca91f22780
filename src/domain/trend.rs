//! Trend classification from price position relative to the trend line.
//!
//! A bar is in a strong uptrend when every bar of the trailing window kept its
//! low above the indicator, and in a strong downtrend when every bar kept its
//! high below it.

use super::ohlcv::Bar;

pub const DEFAULT_LOOKBACK: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendState {
    #[default]
    NoTrend,
    StrongUp,
    StrongDown,
}

/// Classify every bar against its EMA.
pub fn classify(bars: &[Bar], lookback: usize) -> Vec<TrendState> {
    classify_with(bars, lookback, |b| b.ema)
}

/// Classify every bar against an arbitrary trend indicator.
///
/// Bars before `lookback - 1` are `NoTrend`. From there on the window is
/// `[i - lookback, i]`, clamped at the start of the series. A window containing
/// an undefined indicator value is never a trend.
pub fn classify_with<F>(bars: &[Bar], lookback: usize, indicator: F) -> Vec<TrendState>
where
    F: Fn(&Bar) -> Option<f64>,
{
    let mut states = vec![TrendState::NoTrend; bars.len()];
    if lookback == 0 {
        return states;
    }

    for i in (lookback - 1)..bars.len() {
        let start = i.saturating_sub(lookback);
        let mut up = true;
        let mut down = true;

        for bar in &bars[start..=i] {
            let Some(line) = indicator(bar) else {
                up = false;
                down = false;
                break;
            };
            if bar.high >= line {
                down = false;
            }
            if bar.low <= line {
                up = false;
            }
            if !up && !down {
                break;
            }
        }

        states[i] = match (up, down) {
            (true, false) => TrendState::StrongUp,
            (false, true) => TrendState::StrongDown,
            _ => TrendState::NoTrend,
        };
    }

    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn bar(i: i64, high: f64, low: f64, ema: Option<f64>) -> Bar {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut b = Bar::new(
            start + Duration::minutes(5 * i),
            (high + low) / 2.0,
            high,
            low,
            (high + low) / 2.0,
            100.0,
        );
        b.ema = ema;
        b
    }

    fn above(n: usize) -> Vec<Bar> {
        (0..n as i64).map(|i| bar(i, 1.2, 1.1, Some(1.0))).collect()
    }

    fn below(n: usize) -> Vec<Bar> {
        (0..n as i64).map(|i| bar(i, 0.9, 0.8, Some(1.0))).collect()
    }

    #[test]
    fn same_length_as_input() {
        assert_eq!(classify(&above(20), 8).len(), 20);
        assert!(classify(&[], 8).is_empty());
    }

    #[test]
    fn early_bars_have_no_trend() {
        let states = classify(&above(20), 8);
        assert!(states[..7].iter().all(|s| *s == TrendState::NoTrend));
        assert!(states[7..].iter().all(|s| *s == TrendState::StrongUp));
    }

    #[test]
    fn strong_down_when_highs_below_line() {
        let states = classify(&below(12), 8);
        assert!(states[7..].iter().all(|s| *s == TrendState::StrongDown));
    }

    #[test]
    fn touching_the_line_breaks_the_trend() {
        let mut bars = above(20);
        // low == ema counts as a touch
        bars[10].low = 1.0;
        let states = classify(&bars, 8);
        assert_eq!(states[9], TrendState::StrongUp);
        for (i, state) in states.iter().enumerate().take(19).skip(10) {
            assert_eq!(*state, TrendState::NoTrend, "bar {}", i);
        }
        // window [11, 19] no longer contains bar 10
        assert_eq!(states[19], TrendState::StrongUp);
    }

    #[test]
    fn window_spans_lookback_plus_one_bars() {
        let mut bars = above(20);
        bars[2].low = 0.5;
        let states = classify(&bars, 8);
        // bar 10 window is [2, 10]
        assert_eq!(states[10], TrendState::NoTrend);
        assert_eq!(states[11], TrendState::StrongUp);
    }

    #[test]
    fn undefined_indicator_in_window_is_no_trend() {
        let mut bars = above(20);
        for b in bars.iter_mut().take(9) {
            b.ema = None;
        }
        let states = classify(&bars, 8);
        assert!(states[..17].iter().all(|s| *s == TrendState::NoTrend));
        assert_eq!(states[17], TrendState::StrongUp);
    }

    #[test]
    fn straddling_the_line_is_no_trend() {
        let bars: Vec<Bar> = (0..10).map(|i| bar(i, 1.1, 0.9, Some(1.0))).collect();
        assert!(classify(&bars, 4).iter().all(|s| *s == TrendState::NoTrend));
    }

    #[test]
    fn zero_lookback_is_all_no_trend() {
        assert!(classify(&above(5), 0).iter().all(|s| *s == TrendState::NoTrend));
    }

    #[test]
    fn custom_indicator_accessor() {
        let bars = above(10);
        let states = classify_with(&bars, 3, |_| Some(2.0));
        assert_eq!(states[2], TrendState::StrongDown);
    }
}
