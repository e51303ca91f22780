//! Backtest pipeline: indicators → trend → signals → one simulation per
//! risk policy → metrics.
//!
//! BacktestConfig gathers every tunable of a run.

use std::path::PathBuf;

use rayon::prelude::*;
use tracing::info;

use super::error::ScalptraderError;
use super::execution::ExecutionConfig;
use super::indicator::{IndicatorConfig, IndicatorKind};
use super::metrics::{ComparisonRow, Metrics, DEFAULT_PERIODS_PER_YEAR};
use super::ohlcv::{Bar, BarSeries};
use super::risk::{PolicyConfig, PolicyKind};
use super::signal::{self, Signal, SignalCounts, Thresholds};
use super::simulator::{SimulationResult, Simulator};
use super::trend::{self, TrendState, DEFAULT_LOOKBACK};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub data_path: Option<PathBuf>,
    /// Bars kept from the start of the file; 0 keeps all.
    pub max_bars: usize,
    pub indicators: IndicatorConfig,
    pub lookback: usize,
    pub thresholds: Thresholds,
    pub execution: ExecutionConfig,
    pub policies: PolicyConfig,
    pub output_dir: PathBuf,
    pub periods_per_year: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            data_path: None,
            max_bars: 0,
            indicators: IndicatorConfig::default(),
            lookback: DEFAULT_LOOKBACK,
            thresholds: Thresholds::default(),
            execution: ExecutionConfig::default(),
            policies: PolicyConfig::default(),
            output_dir: PathBuf::from("backtest"),
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), ScalptraderError> {
        if self.lookback == 0 {
            return Err(ScalptraderError::config_invalid(
                "signal",
                "lookback",
                "lookback must be at least 1",
            ));
        }
        let periods = [
            ("ema_period", self.indicators.ema_period),
            ("rsi_period", self.indicators.rsi_period),
            ("atr_period", self.indicators.atr_period),
        ];
        for (key, value) in periods {
            if value == 0 {
                return Err(ScalptraderError::config_invalid(
                    "indicators",
                    key,
                    format!("{} must be at least 1", key),
                ));
            }
        }
        Thresholds::new(self.thresholds.oversold, self.thresholds.overbought)?;
        self.execution.validate()?;
        self.policies.validate()?;
        if !(self.periods_per_year > 0.0) {
            return Err(ScalptraderError::config_invalid(
                "report",
                "periods_per_year",
                "periods_per_year must be positive",
            ));
        }
        Ok(())
    }
}

/// Trend states and signals for a prepared series.
#[derive(Debug, Clone)]
pub struct SignalFrame {
    pub trends: Vec<TrendState>,
    pub signals: Vec<Signal>,
}

/// Attach indicators, check they exist, then classify and generate signals.
pub fn prepare(series: BarSeries, config: &BacktestConfig) -> Result<(BarSeries, SignalFrame), ScalptraderError> {
    let series = series.truncate(config.max_bars).with_indicators(&config.indicators);
    for kind in [IndicatorKind::Ema, IndicatorKind::Rsi, IndicatorKind::Atr] {
        series.ensure_indicator(kind)?;
    }

    let frame = generate_signals(series.bars(), config);
    Ok((series, frame))
}

pub fn generate_signals(bars: &[Bar], config: &BacktestConfig) -> SignalFrame {
    let trends = trend::classify(bars, config.lookback);
    let signals = signal::generate_for_bars(bars, &trends, &config.thresholds);

    let counts = SignalCounts::tally(&signals);
    info!(
        bars = bars.len(),
        lookback = config.lookback,
        buy = counts.buy,
        sell = counts.sell,
        "signals generated"
    );

    SignalFrame { trends, signals }
}

/// A finished policy run and its statistics.
#[derive(Debug, Clone)]
pub struct PolicyRun {
    pub result: SimulationResult,
    pub metrics: Metrics,
}

impl PolicyRun {
    pub fn policy(&self) -> PolicyKind {
        self.result.policy
    }

    pub fn comparison_row(&self) -> ComparisonRow {
        ComparisonRow::new(self.policy(), &self.metrics)
    }
}

pub fn run_policy(
    bars: &[Bar],
    signals: &[Signal],
    kind: PolicyKind,
    config: &BacktestConfig,
) -> Result<PolicyRun, ScalptraderError> {
    config.validate()?;
    let simulator = Simulator::new(config.policies.build(kind), config.execution.clone())?;
    let result = simulator.run(bars, signals)?;
    let metrics = Metrics::compute(&result.account, config.periods_per_year);

    info!(
        policy = %kind,
        trades = metrics.total_trades,
        return_pct = metrics.total_return * 100.0,
        skipped = result.skipped_entries,
        "policy run complete"
    );

    Ok(PolicyRun { result, metrics })
}

/// Run each policy as an independent task; output order follows `kinds`.
pub fn run_policies(
    bars: &[Bar],
    signals: &[Signal],
    kinds: &[PolicyKind],
    config: &BacktestConfig,
) -> Result<Vec<PolicyRun>, ScalptraderError> {
    config.validate()?;
    kinds
        .par_iter()
        .map(|&kind| run_policy(bars, signals, kind, config))
        .collect()
}
