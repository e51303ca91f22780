//! Report generation port trait.

use crate::domain::backtest::PolicyRun;
use crate::domain::error::ScalptraderError;
use crate::domain::metrics::ComparisonRow;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write_run(&self, run: &PolicyRun) -> Result<(), ScalptraderError>;

    fn write_comparison(&self, rows: &[ComparisonRow]) -> Result<(), ScalptraderError>;

    /// Default implementation: every run, then the comparison table.
    fn write_all(&self, runs: &[PolicyRun]) -> Result<(), ScalptraderError> {
        for run in runs {
            self.write_run(run)?;
        }
        let rows: Vec<ComparisonRow> = runs.iter().map(PolicyRun::comparison_row).collect();
        self.write_comparison(&rows)
    }
}
