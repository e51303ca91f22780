//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, PolicyRun};
use crate::domain::error::ScalptraderError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::indicator::IndicatorConfig;
use crate::domain::metrics::ComparisonRow;
use crate::domain::ohlcv::BarSeries;
use crate::domain::risk::{PolicyConfig, PolicyKind};
use crate::domain::signal::Thresholds;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "scalptrader", about = "EMA/RSI scalping backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest for one or all risk policies
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [data] path
        #[arg(long)]
        data: Option<PathBuf>,
        /// Overrides [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// fixed, volatility or trailing; all three when omitted
        #[arg(long)]
        policy: Option<PolicyKind>,
        #[arg(short, long)]
        verbose: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show bar count and time range of a data file
    Info {
        #[arg(long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            policy,
            verbose,
        } => {
            init_tracing(verbose);
            run_backtest(&config, data, output, policy)
        }
        Command::Validate { config } => {
            init_tracing(false);
            run_validate(&config)
        }
        Command::Info { data } => {
            init_tracing(false);
            run_info(&data)
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(
            Targets::new()
                .with_target("scalptrader", level)
                .with_default(Level::INFO),
        );
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

fn fail(err: ScalptraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

fn get_count(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ScalptraderError> {
    let value = adapter.get_int(section, key, default as i64)?;
    usize::try_from(value)
        .map_err(|_| ScalptraderError::config_invalid(section, key, format!("{} must not be negative", key)))
}

/// Read every section into a validated `BacktestConfig`.
pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, ScalptraderError> {
    let defaults = BacktestConfig::default();
    let ind = IndicatorConfig::default();
    let exec = ExecutionConfig::default();
    let pol = PolicyConfig::default();

    let thresholds = Thresholds::new(
        adapter.get_double("signal", "oversold", defaults.thresholds.oversold)?,
        adapter.get_double("signal", "overbought", defaults.thresholds.overbought)?,
    )?;

    let config = BacktestConfig {
        data_path: adapter
            .get_string("data", "path")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from),
        max_bars: get_count(adapter, "data", "max_bars", defaults.max_bars)?,
        indicators: IndicatorConfig {
            ema_period: get_count(adapter, "indicators", "ema_period", ind.ema_period)?,
            rsi_period: get_count(adapter, "indicators", "rsi_period", ind.rsi_period)?,
            atr_period: get_count(adapter, "indicators", "atr_period", ind.atr_period)?,
        },
        lookback: get_count(adapter, "signal", "lookback", defaults.lookback)?,
        thresholds,
        execution: ExecutionConfig {
            initial_cash: adapter.get_double("account", "initial_cash", exec.initial_cash)?,
            leverage: adapter.get_double("account", "leverage", exec.leverage)?,
            base_size: adapter.get_double("account", "base_size", exec.base_size)?,
            commission_per_trade: adapter.get_double(
                "account",
                "commission_per_trade",
                exec.commission_per_trade,
            )?,
            commission_rate: adapter.get_double("account", "commission_rate", exec.commission_rate)?,
            allow_same_bar_reentry: adapter.get_bool(
                "account",
                "allow_same_bar_reentry",
                exec.allow_same_bar_reentry,
            )?,
        },
        policies: PolicyConfig {
            fixed_distance: adapter.get_double("fixed", "distance", pol.fixed_distance)?,
            volatility_stop_atr: adapter.get_double(
                "volatility",
                "stop_atr_multiplier",
                pol.volatility_stop_atr,
            )?,
            volatility_tp_ratio: adapter.get_double(
                "volatility",
                "take_profit_ratio",
                pol.volatility_tp_ratio,
            )?,
            trailing_stop_atr: adapter.get_double(
                "trailing",
                "stop_atr_multiplier",
                pol.trailing_stop_atr,
            )?,
        },
        output_dir: adapter
            .get_string("report", "output_dir")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir),
        periods_per_year: adapter.get_double("report", "periods_per_year", defaults.periods_per_year)?,
    };

    config.validate()?;
    Ok(config)
}

/// Policies selected on the command line, or all of them.
pub fn resolve_policies(policy: Option<PolicyKind>) -> Vec<PolicyKind> {
    match policy {
        Some(kind) => vec![kind],
        None => PolicyKind::ALL.to_vec(),
    }
}

fn run_backtest(
    config_path: &Path,
    data_override: Option<PathBuf>,
    output_override: Option<PathBuf>,
    policy: Option<PolicyKind>,
) -> ExitCode {
    info!(path = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let mut bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    if let Some(data) = data_override {
        bt_config.data_path = Some(data);
    }
    if let Some(output) = output_override {
        bt_config.output_dir = output;
    }

    let Some(data_path) = bt_config.data_path.clone() else {
        return fail(ScalptraderError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        });
    };

    let data_port = CsvAdapter::new(data_path);
    let report_port = CsvReportAdapter::new(bt_config.output_dir.clone());
    let kinds = resolve_policies(policy);

    match run_backtest_pipeline(&data_port, &report_port, &bt_config, &kinds) {
        Ok(runs) => {
            let rows: Vec<ComparisonRow> = runs.iter().map(PolicyRun::comparison_row).collect();
            print!("{}", format_comparison(&rows));
            eprintln!("\nReports written to: {}", bt_config.output_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Load → validate → indicators → signals → simulate → report.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    bt_config: &BacktestConfig,
    kinds: &[PolicyKind],
) -> Result<Vec<PolicyRun>, ScalptraderError> {
    let series = BarSeries::new(data_port.fetch_bars()?)?;
    let (series, frame) = backtest_engine::prepare(series, bt_config)?;
    info!(
        bars = series.len(),
        from = %series.first().timestamp,
        to = %series.last().timestamp,
        "running backtest"
    );

    let runs = backtest_engine::run_policies(series.bars(), &frame.signals, kinds, bt_config)?;
    report_port.write_all(&runs)?;
    Ok(runs)
}

pub fn format_comparison(rows: &[ComparisonRow]) -> String {
    let mut out = format!(
        "{:<22} {:>10} {:>10} {:>9} {:>11}\n",
        "Strategy", "Return %", "Max DD %", "# Trades", "Win Rate %"
    );
    for row in rows {
        out.push_str(&format!(
            "{:<22} {:>10.2} {:>10.2} {:>9} {:>11.2}\n",
            row.policy.label(),
            row.return_pct,
            row.max_drawdown_pct,
            row.trades,
            row.win_rate_pct,
        ));
    }
    out
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    match &config.data_path {
        Some(path) => eprintln!("  data:        {}", path.display()),
        None => eprintln!("  data:        (none, pass --data)"),
    }
    eprintln!(
        "  indicators:  EMA({}) RSI({}) ATR({})",
        config.indicators.ema_period, config.indicators.rsi_period, config.indicators.atr_period
    );
    eprintln!(
        "  signal:      lookback {}, oversold {}, overbought {}",
        config.lookback, config.thresholds.oversold, config.thresholds.overbought
    );
    eprintln!(
        "  account:     cash {}, leverage {}, base size {}",
        config.execution.initial_cash, config.execution.leverage, config.execution.base_size
    );
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(data_path: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(data_path.to_path_buf());
    match adapter.get_data_range() {
        Ok(Some((first, last, count))) => {
            println!("{}: {} bars, {} to {}", data_path.display(), count, first, last);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("No usable bars in {}", data_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
