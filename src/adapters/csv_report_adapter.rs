//! CSV export of trajectories and the metrics comparison.
//!
//! Writes one `<ticker>_<strategy>.csv` per successful run and a single
//! `<ticker>_metrics.csv` with one row per selected strategy.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::backtest::{BacktestConfig, StrategyOutcome};
use crate::domain::error::DcaError;
use crate::domain::trajectory::PortfolioTrajectory;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct MetricsRow<'a> {
    ticker: &'a str,
    strategy: &'static str,
    total_invested: Option<f64>,
    final_value: Option<f64>,
    roi_pct: Option<f64>,
    irr_annual_pct: Option<f64>,
    cagr_pct: Option<f64>,
    max_drawdown_pct: Option<f64>,
    calmar_ratio: Option<f64>,
    years: Option<f64>,
    error: Option<String>,
}

impl<'a> MetricsRow<'a> {
    fn from_outcome(ticker: &'a str, outcome: &StrategyOutcome) -> Self {
        let partial = outcome.partial_metrics();
        MetricsRow {
            ticker,
            strategy: outcome.kind.key(),
            total_invested: partial.map(|m| m.total_invested),
            final_value: partial.map(|m| m.final_value),
            roi_pct: partial.and_then(|m| m.roi_pct),
            irr_annual_pct: partial.and_then(|m| m.irr_annual_pct),
            cagr_pct: partial.and_then(|m| m.cagr_pct),
            max_drawdown_pct: partial.map(|m| m.max_drawdown_pct),
            calmar_ratio: partial.and_then(|m| m.calmar_ratio),
            years: partial.and_then(|m| m.years),
            error: outcome.error().map(|e| e.to_string()),
        }
    }
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn trajectory_path(&self, ticker: &str, key: &str) -> PathBuf {
        self.output_dir.join(format!("{}_{}.csv", ticker, key))
    }

    pub fn metrics_path(&self, ticker: &str) -> PathBuf {
        self.output_dir.join(format!("{}_metrics.csv", ticker))
    }

    fn write_trajectory(path: &Path, trajectory: &PortfolioTrajectory) -> Result<(), DcaError> {
        let mut wtr = csv::Writer::from_path(path)?;
        for state in trajectory {
            wtr.serialize(state)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        config: &BacktestConfig,
        outcomes: &[StrategyOutcome],
    ) -> Result<(), DcaError> {
        fs::create_dir_all(&self.output_dir)?;

        for outcome in outcomes {
            if let Some(trajectory) = outcome.trajectory() {
                let path = self.trajectory_path(&config.ticker, outcome.kind.key());
                Self::write_trajectory(&path, trajectory)?;
                tracing::debug!(path = %path.display(), "wrote trajectory");
            }
        }

        let path = self.metrics_path(&config.ticker);
        let mut wtr = csv::Writer::from_path(&path)?;
        for outcome in outcomes {
            wtr.serialize(MetricsRow::from_outcome(&config.ticker, outcome))?;
        }
        wtr.flush()?;

        tracing::info!(dir = %self.output_dir.display(), "CSV report written");
        Ok(())
    }
}
