//! Report generation port trait.

use crate::domain::backtest::{BacktestConfig, StrategyOutcome};
use crate::domain::error::DcaError;

/// Port for presenting a strategy comparison.
pub trait ReportPort {
    fn write(
        &self,
        config: &BacktestConfig,
        outcomes: &[StrategyOutcome],
    ) -> Result<(), DcaError>;
}
