//! Backtest parameters and side-by-side strategy comparison.
//!
//! BacktestConfig holds the shared knobs every strategy is built from.

use chrono::NaiveDate;

use crate::domain::error::DcaError;
use crate::domain::metrics::{MetricsReport, PartialMetrics};
use crate::domain::price::PriceSeries;
use crate::domain::strategy::{
    DEFAULT_DRAWDOWN_THRESHOLD, DEFAULT_MONTHLY_CONTRIB, DEFAULT_MONTHLY_GROWTH,
    DEFAULT_SMA_WINDOW, DoubleDownParams, LumpSumParams, ROLLING_HIGH_DAYS, SmaParams,
    StandardDcaParams, Strategy, StrategyKind, ValueAveragingParams,
};
use crate::domain::trajectory::PortfolioTrajectory;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub ticker: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub monthly_contrib: f64,
    pub strategies: Vec<StrategyKind>,
    pub drawdown_threshold: f64,
    pub rolling_high_days: usize,
    pub sma_window: usize,
    pub monthly_growth: f64,
}

impl BacktestConfig {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            start_date: None,
            end_date: None,
            monthly_contrib: DEFAULT_MONTHLY_CONTRIB,
            strategies: vec![StrategyKind::StandardDca],
            drawdown_threshold: DEFAULT_DRAWDOWN_THRESHOLD,
            rolling_high_days: ROLLING_HIGH_DAYS,
            sma_window: DEFAULT_SMA_WINDOW,
            monthly_growth: DEFAULT_MONTHLY_GROWTH,
        }
    }

    pub fn strategy(&self, kind: StrategyKind) -> Strategy {
        let monthly_contrib = self.monthly_contrib;
        let sma = SmaParams {
            monthly_contrib,
            window: self.sma_window,
        };
        match kind {
            StrategyKind::StandardDca => Strategy::StandardDca(StandardDcaParams { monthly_contrib }),
            StrategyKind::DoubleDownDca => Strategy::DoubleDownDca(DoubleDownParams {
                monthly_contrib,
                threshold: self.drawdown_threshold,
                lookback: self.rolling_high_days,
            }),
            StrategyKind::LumpSum => Strategy::LumpSum(LumpSumParams { monthly_contrib }),
            StrategyKind::SmaMomentum => Strategy::SmaMomentum(sma),
            StrategyKind::SmaMeanReversion => Strategy::SmaMeanReversion(sma),
            StrategyKind::ValueAveraging => Strategy::ValueAveraging(ValueAveragingParams {
                monthly_contrib,
                monthly_growth: self.monthly_growth,
            }),
        }
    }

    /// The selected strategies, in selection order.
    pub fn build_strategies(&self) -> Vec<Strategy> {
        self.strategies.iter().map(|&k| self.strategy(k)).collect()
    }
}

/// A completed simulation and its metrics, which may fail on their own.
#[derive(Debug)]
pub struct StrategyRun {
    pub trajectory: PortfolioTrajectory,
    pub metrics: Result<MetricsReport, DcaError>,
}

#[derive(Debug)]
pub struct StrategyOutcome {
    pub kind: StrategyKind,
    pub run: Result<StrategyRun, DcaError>,
}

impl StrategyOutcome {
    pub fn trajectory(&self) -> Option<&PortfolioTrajectory> {
        self.run.as_ref().ok().map(|r| &r.trajectory)
    }

    pub fn metrics(&self) -> Option<&MetricsReport> {
        self.run.as_ref().ok().and_then(|r| r.metrics.as_ref().ok())
    }

    /// Metrics for display: the full report when it exists, otherwise
    /// whatever can still be derived from the trajectory.
    pub fn partial_metrics(&self) -> Option<PartialMetrics> {
        let run = self.run.as_ref().ok()?;
        Some(match &run.metrics {
            Ok(report) => PartialMetrics::from(*report),
            Err(_) => PartialMetrics::compute(&run.trajectory),
        })
    }

    pub fn error(&self) -> Option<&DcaError> {
        self.run.as_ref().err()
    }
}

/// Run every strategy over the same series. Runs share nothing, so one
/// failing does not affect the others; each outcome carries its own error.
pub fn run_comparison(series: &PriceSeries, strategies: &[Strategy]) -> Vec<StrategyOutcome> {
    strategies
        .iter()
        .map(|strategy| {
            let kind = strategy.kind();
            let run = strategy.run(series).map(|trajectory| {
                let metrics = MetricsReport::compute(&trajectory);
                if let Err(e) = &metrics {
                    tracing::warn!(strategy = %kind, error = %e, "metrics unavailable");
                }
                StrategyRun {
                    trajectory,
                    metrics,
                }
            });
            if let Err(e) = &run {
                tracing::warn!(strategy = %kind, error = %e, "strategy run failed");
            }
            StrategyOutcome { kind, run }
        })
        .collect()
}
