//! CSV report adapter: per-policy trades, equity and stats files plus a
//! cross-policy comparison table.

use crate::domain::backtest::PolicyRun;
use crate::domain::error::ScalptraderError;
use crate::domain::metrics::ComparisonRow;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn file(&self, name: &str) -> Result<PathBuf, ScalptraderError> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(self.output_dir.join(name))
    }

    fn write_trades(&self, run: &PolicyRun) -> Result<(), ScalptraderError> {
        let path = self.file(&format!("{}_trades.csv", run.policy().label()))?;
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record([
            "direction",
            "entry_time",
            "exit_time",
            "entry_index",
            "exit_index",
            "entry_price",
            "exit_price",
            "size",
            "gross_pnl",
            "commission",
            "pnl",
            "return_pct",
            "exit_reason",
        ])?;
        for t in run.result.trades() {
            wtr.write_record([
                t.direction.to_string(),
                t.entry_time.format(TIME_FORMAT).to_string(),
                t.exit_time.format(TIME_FORMAT).to_string(),
                t.entry_index.to_string(),
                t.exit_index.to_string(),
                t.entry_price.to_string(),
                t.exit_price.to_string(),
                t.size.to_string(),
                t.gross_pnl.to_string(),
                t.commission.to_string(),
                t.pnl.to_string(),
                format!("{:.4}", t.return_pct() * 100.0),
                t.exit_reason.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_equity(&self, run: &PolicyRun) -> Result<(), ScalptraderError> {
        let path = self.file(&format!("{}_equity.csv", run.policy().label()))?;
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(["timestamp", "equity", "position", "stop_loss"])?;

        let rows = run
            .result
            .account
            .equity_curve
            .iter()
            .zip(&run.result.exposure)
            .zip(&run.result.stop_levels);
        for ((point, exposure), stop) in rows {
            wtr.write_record([
                point.timestamp.format(TIME_FORMAT).to_string(),
                point.equity.to_string(),
                exposure.map(|d| d.to_string()).unwrap_or_default(),
                stop.map(|s| s.to_string()).unwrap_or_default(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_stats(&self, run: &PolicyRun) -> Result<(), ScalptraderError> {
        let path = self.file(&format!("{}_stats.csv", run.policy().label()))?;
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(["metric", "value"])?;
        wtr.write_record(["Strategy", run.policy().label()])?;
        for (name, value) in run.metrics.summary() {
            wtr.write_record([name.to_string(), format!("{:.6}", value)])?;
        }
        wtr.write_record([
            "Skipped Entries".to_string(),
            run.result.skipped_entries.to_string(),
        ])?;
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_run(&self, run: &PolicyRun) -> Result<(), ScalptraderError> {
        self.write_trades(run)?;
        self.write_equity(run)?;
        self.write_stats(run)?;
        info!(
            policy = %run.policy(),
            dir = %self.output_dir.display(),
            "report written"
        );
        Ok(())
    }

    fn write_comparison(&self, rows: &[ComparisonRow]) -> Result<(), ScalptraderError> {
        let path = self.file("comparison.csv")?;
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(["Strategy", "Return %", "Max DD %", "# Trades", "Win Rate %"])?;
        for row in rows {
            wtr.write_record([
                row.policy.label().to_string(),
                format!("{:.2}", row.return_pct),
                format!("{:.2}", row.max_drawdown_pct),
                row.trades.to_string(),
                format!("{:.2}", row.win_rate_pct),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{run_policy, BacktestConfig};
    use crate::domain::ohlcv::Bar;
    use crate::domain::risk::PolicyKind;
    use crate::domain::signal::Signal;
    use chrono::{Duration, NaiveDate};
    use tempfile::TempDir;

    fn sample_run() -> PolicyRun {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars: Vec<Bar> = (0..5)
            .map(|i| {
                let mut b = Bar::new(
                    start + Duration::minutes(5 * i),
                    1.0,
                    1.001,
                    0.999,
                    1.0,
                    100.0,
                );
                b.atr = Some(0.001);
                b
            })
            .collect();
        let mut signals = vec![Signal::None; 5];
        signals[1] = Signal::Buy;
        run_policy(&bars, &signals, PolicyKind::Volatility, &BacktestConfig::default()).unwrap()
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn write_run_creates_three_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested");
        let adapter = CsvReportAdapter::new(out.clone());
        let run = sample_run();

        adapter.write_run(&run).unwrap();

        let trades = read_lines(&out.join("ATRBased_trades.csv"));
        assert!(trades[0].starts_with("direction,entry_time"));
        assert_eq!(trades.len(), 1 + run.result.trades().len());
        assert!(trades[1].ends_with("end_of_data"));

        let equity = read_lines(&out.join("ATRBased_equity.csv"));
        assert_eq!(equity.len(), 1 + 5);
        assert!(equity[1].starts_with("2024-01-15 00:00:00,100"));

        let stats = read_lines(&out.join("ATRBased_stats.csv"));
        assert_eq!(stats[1], "Strategy,ATRBased");
        assert!(stats.iter().any(|l| l.starts_with("# Trades,1.0")));
    }

    #[test]
    fn write_comparison_table() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().to_path_buf());
        let run = sample_run();

        adapter.write_comparison(&[run.comparison_row()]).unwrap();

        let lines = read_lines(&dir.path().join("comparison.csv"));
        assert_eq!(lines[0], "Strategy,Return %,Max DD %,# Trades,Win Rate %");
        assert!(lines[1].starts_with("ATRBased,"));
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn write_all_writes_every_run() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().to_path_buf());
        adapter.write_all(&[sample_run()]).unwrap();
        assert!(dir.path().join("ATRBased_stats.csv").exists());
        assert!(dir.path().join("comparison.csv").exists());
    }
}
