//! Portfolio trajectory: one state per monthly observation.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::DcaError;
use super::monthly::MonthlyObservation;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioState {
    /// Period label, the first day of the month.
    pub date: NaiveDate,
    pub trade_date: NaiveDate,
    pub close: f64,
    pub shares_total: f64,
    pub invested_total: f64,
    pub portf_value: f64,
    pub profit_loss: f64,
    pub signal: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortfolioTrajectory {
    states: Vec<PortfolioState>,
}

impl PortfolioTrajectory {
    pub fn states(&self) -> &[PortfolioState] {
        &self.states
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PortfolioState> {
        self.states.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn first(&self) -> Option<&PortfolioState> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&PortfolioState> {
        self.states.last()
    }

    pub fn final_value(&self) -> f64 {
        self.last().map(|s| s.portf_value).unwrap_or(0.0)
    }

    pub fn final_invested(&self) -> f64 {
        self.last().map(|s| s.invested_total).unwrap_or(0.0)
    }

    /// Amount invested in each period: `invested_total[0]`, then the
    /// period-over-period increase.
    pub fn contributions(&self) -> Vec<f64> {
        let mut prev = 0.0;
        self.states
            .iter()
            .map(|s| {
                let c = s.invested_total - prev;
                prev = s.invested_total;
                c
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a PortfolioTrajectory {
    type Item = &'a PortfolioState;
    type IntoIter = std::slice::Iter<'a, PortfolioState>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}

/// Accumulates shares and capital period by period.
///
/// Each recorded state satisfies `portf_value == shares_total * close` and
/// `profit_loss == portf_value - invested_total` exactly. A failed `record`
/// leaves the builder untouched, but callers are expected to drop it: no
/// partial trajectory is ever returned from a strategy run.
#[derive(Debug, Default)]
pub struct TrajectoryBuilder {
    states: Vec<PortfolioState>,
    shares_total: f64,
    invested_total: f64,
}

impl TrajectoryBuilder {
    pub fn with_capacity(periods: usize) -> Self {
        Self {
            states: Vec::with_capacity(periods),
            shares_total: 0.0,
            invested_total: 0.0,
        }
    }

    pub fn shares_total(&self) -> f64 {
        self.shares_total
    }

    #[cfg(test)]
    pub fn invested_total(&self) -> f64 {
        self.invested_total
    }

    #[cfg(test)]
    pub fn periods(&self) -> usize {
        self.states.len()
    }

    /// Buy `contribution / close` shares at the observation's close and emit
    /// the period's state. A zero contribution still emits a state.
    pub fn record(
        &mut self,
        observation: &MonthlyObservation,
        contribution: f64,
    ) -> Result<&PortfolioState, DcaError> {
        let close = observation.close;
        if !close.is_finite() || close <= 0.0 {
            return Err(DcaError::computation(format!(
                "cannot buy at close {} on {}",
                close, observation.trade_date
            )));
        }
        if !contribution.is_finite() || contribution < 0.0 {
            return Err(DcaError::computation(format!(
                "undefined contribution {} on {}",
                contribution, observation.trade_date
            )));
        }

        let shares_total = self.shares_total + contribution / close;
        let invested_total = self.invested_total + contribution;
        if !shares_total.is_finite() || !invested_total.is_finite() {
            return Err(DcaError::computation(format!(
                "portfolio totals overflowed on {}",
                observation.trade_date
            )));
        }
        self.shares_total = shares_total;
        self.invested_total = invested_total;

        let portf_value = shares_total * close;
        self.states.push(PortfolioState {
            date: observation.month,
            trade_date: observation.trade_date,
            close,
            shares_total,
            invested_total,
            portf_value,
            profit_loss: portf_value - invested_total,
            signal: observation.signal,
        });

        Ok(&self.states[self.states.len() - 1])
    }

    pub fn finish(self) -> PortfolioTrajectory {
        PortfolioTrajectory {
            states: self.states,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(month: u32, close: f64) -> MonthlyObservation {
        let date = NaiveDate::from_ymd_opt(2024, month, 1).unwrap();
        MonthlyObservation {
            month: date,
            trade_date: date,
            close,
            day_index: month as usize,
            signal: None,
        }
    }

    #[test]
    fn record_accumulates_totals() {
        let mut builder = TrajectoryBuilder::with_capacity(3);
        builder.record(&obs(1, 10.0), 100.0).unwrap();
        builder.record(&obs(2, 20.0), 100.0).unwrap();
        builder.record(&obs(3, 25.0), 100.0).unwrap();
        let t = builder.finish();

        let shares: Vec<f64> = t.iter().map(|s| s.shares_total).collect();
        let values: Vec<f64> = t.iter().map(|s| s.portf_value).collect();
        assert_eq!(shares, vec![10.0, 15.0, 19.0]);
        assert_eq!(values, vec![100.0, 300.0, 475.0]);
        assert_eq!(t.final_invested(), 300.0);
        assert_eq!(t.last().unwrap().profit_loss, 175.0);
    }

    #[test]
    fn zero_contribution_still_emits_period() {
        let mut builder = TrajectoryBuilder::default();
        builder.record(&obs(1, 10.0), 0.0).unwrap();
        let t = builder.finish();
        assert_eq!(t.len(), 1);
        assert_eq!(t.first().unwrap().shares_total, 0.0);
        assert_eq!(t.first().unwrap().portf_value, 0.0);
    }

    #[test]
    fn zero_close_is_computation_error() {
        let mut builder = TrajectoryBuilder::default();
        let err = builder.record(&obs(1, 0.0), 100.0).unwrap_err();
        assert!(matches!(err, DcaError::Computation { .. }));
        assert_eq!(builder.periods(), 0);
        assert_eq!(builder.invested_total(), 0.0);
    }

    #[test]
    fn negative_contribution_is_computation_error() {
        let mut builder = TrajectoryBuilder::default();
        let err = builder.record(&obs(1, 10.0), -1.0).unwrap_err();
        assert!(matches!(err, DcaError::Computation { .. }));
    }

    #[test]
    fn contributions_are_invested_diffs() {
        let mut builder = TrajectoryBuilder::default();
        builder.record(&obs(1, 10.0), 100.0).unwrap();
        builder.record(&obs(2, 10.0), 0.0).unwrap();
        builder.record(&obs(3, 10.0), 200.0).unwrap();
        assert_eq!(builder.finish().contributions(), vec![100.0, 0.0, 200.0]);
    }

    #[test]
    fn empty_trajectory_finals_are_zero() {
        let t = PortfolioTrajectory::default();
        assert!(t.is_empty());
        assert_eq!(t.final_value(), 0.0);
        assert_eq!(t.final_invested(), 0.0);
    }
}
