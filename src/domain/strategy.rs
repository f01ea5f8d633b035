//! Contribution strategies.
//!
//! A strategy is a left fold over monthly observations: each period decides a
//! contribution, buys `contribution / close` shares and records the running
//! totals. Nothing here ever sells. The six variants form a closed enum, each
//! with its own parameter struct.
//!
//! Conditions that look at price history (rolling high, SMA) are evaluated on
//! the daily series up to and including the sampled day. While a trailing
//! window is still warming up the condition is `false`: DoubleDownDCA pays the
//! normal amount and the SMA variants skip the contribution. The period itself
//! is always kept.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::DcaError;
use crate::domain::indicator::{calculate_rolling_high, calculate_sma};
use crate::domain::monthly::{sample_monthly, sample_monthly_with_signal, MonthlyObservation};
use crate::domain::price::PriceSeries;
use crate::domain::trajectory::{PortfolioTrajectory, TrajectoryBuilder};

pub const DEFAULT_MONTHLY_CONTRIB: f64 = 150.0;
pub const DEFAULT_DRAWDOWN_THRESHOLD: f64 = 0.15;
/// Trading days in the rolling-high window (one year).
pub const ROLLING_HIGH_DAYS: usize = 252;
pub const DEFAULT_SMA_WINDOW: usize = 90;
/// ~0.6% per month, about 7.4% per year.
pub const DEFAULT_MONTHLY_GROWTH: f64 = 0.006;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyKind {
    StandardDca,
    DoubleDownDca,
    LumpSum,
    SmaMomentum,
    SmaMeanReversion,
    ValueAveraging,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::StandardDca,
        StrategyKind::DoubleDownDca,
        StrategyKind::LumpSum,
        StrategyKind::SmaMomentum,
        StrategyKind::SmaMeanReversion,
        StrategyKind::ValueAveraging,
    ];

    /// Identifier used in config files and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            StrategyKind::StandardDca => "dca",
            StrategyKind::DoubleDownDca => "double_down",
            StrategyKind::LumpSum => "lump_sum",
            StrategyKind::SmaMomentum => "sma_momentum",
            StrategyKind::SmaMeanReversion => "sma_mean_reversion",
            StrategyKind::ValueAveraging => "value_averaging",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StrategyKind::StandardDca => "DCA",
            StrategyKind::DoubleDownDca => "Double Down DCA",
            StrategyKind::LumpSum => "Lump Sum",
            StrategyKind::SmaMomentum => "SMA Momentum",
            StrategyKind::SmaMeanReversion => "SMA Mean Reversion",
            StrategyKind::ValueAveraging => "Value Averaging",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StrategyKind {
    type Err = DcaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.key() == wanted)
            .ok_or_else(|| {
                DcaError::config(
                    "strategy",
                    format!(
                        "unknown strategy '{}' (expected one of: {})",
                        s.trim(),
                        StrategyKind::ALL.map(|k| k.key()).join(", ")
                    ),
                )
            })
    }
}

/// Parse a comma-separated strategy list, rejecting empty entries and repeats.
pub fn parse_strategy_list(input: &str) -> Result<Vec<StrategyKind>, DcaError> {
    let mut kinds = Vec::new();
    for token in input.split(',') {
        if token.trim().is_empty() {
            return Err(DcaError::config("strategies", "empty entry in strategy list"));
        }
        let kind: StrategyKind = token.parse()?;
        if kinds.contains(&kind) {
            return Err(DcaError::config(
                "strategies",
                format!("duplicate strategy '{}'", kind.key()),
            ));
        }
        kinds.push(kind);
    }
    Ok(kinds)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardDcaParams {
    pub monthly_contrib: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleDownParams {
    pub monthly_contrib: f64,
    /// Fractional drop below the rolling high that doubles the contribution.
    pub threshold: f64,
    /// Rolling-high window in trading days.
    pub lookback: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LumpSumParams {
    /// Budget is `months * monthly_contrib`, the same capital StandardDCA
    /// deploys over the same horizon.
    pub monthly_contrib: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmaParams {
    pub monthly_contrib: f64,
    /// SMA window in trading days.
    pub window: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueAveragingParams {
    /// Base step of the target path.
    pub monthly_contrib: f64,
    pub monthly_growth: f64,
}

impl Default for StandardDcaParams {
    fn default() -> Self {
        Self {
            monthly_contrib: DEFAULT_MONTHLY_CONTRIB,
        }
    }
}

impl Default for DoubleDownParams {
    fn default() -> Self {
        Self {
            monthly_contrib: DEFAULT_MONTHLY_CONTRIB,
            threshold: DEFAULT_DRAWDOWN_THRESHOLD,
            lookback: ROLLING_HIGH_DAYS,
        }
    }
}

impl Default for LumpSumParams {
    fn default() -> Self {
        Self {
            monthly_contrib: DEFAULT_MONTHLY_CONTRIB,
        }
    }
}

impl Default for SmaParams {
    fn default() -> Self {
        Self {
            monthly_contrib: DEFAULT_MONTHLY_CONTRIB,
            window: DEFAULT_SMA_WINDOW,
        }
    }
}

impl Default for ValueAveragingParams {
    fn default() -> Self {
        Self {
            monthly_contrib: DEFAULT_MONTHLY_CONTRIB,
            monthly_growth: DEFAULT_MONTHLY_GROWTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    StandardDca(StandardDcaParams),
    DoubleDownDca(DoubleDownParams),
    LumpSum(LumpSumParams),
    SmaMomentum(SmaParams),
    SmaMeanReversion(SmaParams),
    ValueAveraging(ValueAveragingParams),
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::StandardDca(_) => StrategyKind::StandardDca,
            Strategy::DoubleDownDca(_) => StrategyKind::DoubleDownDca,
            Strategy::LumpSum(_) => StrategyKind::LumpSum,
            Strategy::SmaMomentum(_) => StrategyKind::SmaMomentum,
            Strategy::SmaMeanReversion(_) => StrategyKind::SmaMeanReversion,
            Strategy::ValueAveraging(_) => StrategyKind::ValueAveraging,
        }
    }

    pub fn monthly_contrib(&self) -> f64 {
        match self {
            Strategy::StandardDca(p) => p.monthly_contrib,
            Strategy::DoubleDownDca(p) => p.monthly_contrib,
            Strategy::LumpSum(p) => p.monthly_contrib,
            Strategy::SmaMomentum(p) | Strategy::SmaMeanReversion(p) => p.monthly_contrib,
            Strategy::ValueAveraging(p) => p.monthly_contrib,
        }
    }

    pub fn validate(&self) -> Result<(), DcaError> {
        validate_contrib(self.monthly_contrib())?;
        match self {
            Strategy::DoubleDownDca(p) => {
                if !p.threshold.is_finite() || p.threshold <= 0.0 || p.threshold >= 1.0 {
                    return Err(DcaError::config(
                        "threshold",
                        format!("must be in (0, 1), got {}", p.threshold),
                    ));
                }
                if p.lookback == 0 {
                    return Err(DcaError::config("lookback", "must be positive"));
                }
            }
            Strategy::SmaMomentum(p) | Strategy::SmaMeanReversion(p) => {
                if p.window == 0 {
                    return Err(DcaError::config("window", "must be positive"));
                }
            }
            Strategy::ValueAveraging(p) => {
                if !p.monthly_growth.is_finite() || p.monthly_growth <= -1.0 {
                    return Err(DcaError::config(
                        "monthly_growth",
                        format!("must be greater than -1, got {}", p.monthly_growth),
                    ));
                }
            }
            Strategy::StandardDca(_) | Strategy::LumpSum(_) => {}
        }
        Ok(())
    }

    /// Sample `series` monthly, attaching this strategy's condition (if any)
    /// as evaluated on the daily series at each sampled day.
    pub fn observe(&self, series: &PriceSeries) -> Result<Vec<MonthlyObservation>, DcaError> {
        match self.daily_signal(series) {
            Some(signal) => sample_monthly_with_signal(series, &signal),
            None => sample_monthly(series),
        }
    }

    fn daily_signal(&self, series: &PriceSeries) -> Option<Vec<bool>> {
        let points = series.points();
        match self {
            Strategy::DoubleDownDca(p) => {
                let high = calculate_rolling_high(points, p.lookback);
                tracing::debug!(
                    indicator = %high.indicator_type,
                    warmup = high.warmup_len(),
                    first_value = ?high.first_valid_date(),
                    "rolling high computed"
                );
                Some(
                    points
                        .iter()
                        .enumerate()
                        .map(|(i, point)| match high.value_at(i) {
                            Some(h) => point.close <= (1.0 - p.threshold) * h,
                            None => false,
                        })
                        .collect(),
                )
            }
            Strategy::SmaMomentum(p) | Strategy::SmaMeanReversion(p) => {
                let momentum = matches!(self, Strategy::SmaMomentum(_));
                let sma = calculate_sma(points, p.window);
                tracing::debug!(
                    indicator = %sma.indicator_type,
                    warmup = sma.warmup_len(),
                    first_value = ?sma.first_valid_date(),
                    "sma computed"
                );
                Some(
                    points
                        .iter()
                        .enumerate()
                        .map(|(i, point)| match sma.value_at(i) {
                            Some(avg) if momentum => point.close > avg,
                            Some(avg) => point.close < avg,
                            None => false,
                        })
                        .collect(),
                )
            }
            Strategy::StandardDca(_) | Strategy::LumpSum(_) | Strategy::ValueAveraging(_) => None,
        }
    }

    /// Fold `observations` into a trajectory.
    ///
    /// Observations without a signal count as condition `false` for the
    /// strategies that use one.
    pub fn simulate(
        &self,
        observations: &[MonthlyObservation],
    ) -> Result<PortfolioTrajectory, DcaError> {
        self.validate()?;
        if observations.is_empty() {
            return Err(DcaError::data("no monthly observations to simulate"));
        }

        let c = self.monthly_contrib();
        let mut builder = TrajectoryBuilder::with_capacity(observations.len());

        for (i, obs) in observations.iter().enumerate() {
            let condition = obs.signal.unwrap_or(false);
            let contribution = match self {
                Strategy::StandardDca(_) => c,
                Strategy::DoubleDownDca(_) => {
                    if condition {
                        2.0 * c
                    } else {
                        c
                    }
                }
                Strategy::LumpSum(_) => {
                    if i == 0 {
                        c * observations.len() as f64
                    } else {
                        0.0
                    }
                }
                Strategy::SmaMomentum(_) | Strategy::SmaMeanReversion(_) => {
                    if condition {
                        c
                    } else {
                        0.0
                    }
                }
                Strategy::ValueAveraging(p) => {
                    let goal = value_averaging_goal(c, p.monthly_growth, i);
                    let current = builder.shares_total() * obs.close;
                    (goal - current).max(0.0)
                }
            };
            builder.record(obs, contribution)?;
        }

        let trajectory = builder.finish();
        tracing::debug!(
            strategy = %self.kind(),
            periods = trajectory.len(),
            invested = trajectory.final_invested(),
            value = trajectory.final_value(),
            "simulation finished"
        );
        Ok(trajectory)
    }

    /// Validate, sample and simulate in one go.
    pub fn run(&self, series: &PriceSeries) -> Result<PortfolioTrajectory, DcaError> {
        self.validate()?;
        let observations = self.observe(series)?;
        self.simulate(&observations)
    }
}

/// Target portfolio value for month `i` (0-based):
/// `monthly_contrib * (1 + i) * (1 + growth)^i`.
pub fn value_averaging_goal(monthly_contrib: f64, growth: f64, i: usize) -> f64 {
    monthly_contrib * (1 + i) as f64 * (1.0 + growth).powi(i as i32)
}

fn validate_contrib(value: f64) -> Result<(), DcaError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DcaError::config(
            "monthly_contrib",
            format!("must be non-negative, got {}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn monthly(closes: &[f64]) -> Vec<MonthlyObservation> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let date = NaiveDate::from_ymd_opt(2024, i as u32 + 1, 1).unwrap();
                MonthlyObservation {
                    month: date,
                    trade_date: date,
                    close,
                    day_index: i,
                    signal: None,
                }
            })
            .collect()
    }

    fn with_signals(mut obs: Vec<MonthlyObservation>, signals: &[bool]) -> Vec<MonthlyObservation> {
        for (o, &s) in obs.iter_mut().zip(signals) {
            o.signal = Some(s);
        }
        obs
    }

    /// One point per calendar day starting 2020-01-01.
    fn daily_series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        PriceSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| PricePoint {
                    date: start + chrono::Duration::days(i as i64),
                    close,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn kind_round_trips_through_key() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.key().parse::<StrategyKind>().unwrap(), kind);
        }
        assert_eq!(" DCA ".parse::<StrategyKind>().unwrap(), StrategyKind::StandardDca);
        assert!("martingale".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn strategy_list_parsing() {
        let kinds = parse_strategy_list("dca, lump_sum,value_averaging").unwrap();
        assert_eq!(
            kinds,
            vec![
                StrategyKind::StandardDca,
                StrategyKind::LumpSum,
                StrategyKind::ValueAveraging
            ]
        );
        assert!(parse_strategy_list("dca,,lump_sum").is_err());
        assert!(parse_strategy_list("dca,dca").is_err());
    }

    #[test]
    fn standard_dca_worked_example() {
        let strategy = Strategy::StandardDca(StandardDcaParams {
            monthly_contrib: 100.0,
        });
        let t = strategy.simulate(&monthly(&[10.0, 20.0, 25.0])).unwrap();

        let shares: Vec<f64> = t.iter().map(|s| s.shares_total).collect();
        let invested: Vec<f64> = t.iter().map(|s| s.invested_total).collect();
        let value: Vec<f64> = t.iter().map(|s| s.portf_value).collect();
        assert_eq!(shares, vec![10.0, 15.0, 19.0]);
        assert_eq!(invested, vec![100.0, 200.0, 300.0]);
        assert_eq!(value, vec![100.0, 300.0, 475.0]);
    }

    #[test]
    fn double_down_doubles_on_signal() {
        let strategy = Strategy::DoubleDownDca(DoubleDownParams {
            monthly_contrib: 100.0,
            ..DoubleDownParams::default()
        });
        let obs = with_signals(monthly(&[10.0, 8.0, 9.0]), &[false, true, false]);
        let t = strategy.simulate(&obs).unwrap();
        assert_eq!(t.contributions(), vec![100.0, 200.0, 100.0]);
        assert_eq!(t.states()[1].signal, Some(true));
    }

    #[test]
    fn double_down_never_doubles_during_warmup() {
        // 200 days of a collapsing price: deep drawdown, but the 252-day high
        // is never defined
        let closes: Vec<f64> = (0..200).map(|i| 100.0 - i as f64 * 0.4).collect();
        let strategy = Strategy::DoubleDownDca(DoubleDownParams {
            monthly_contrib: 50.0,
            threshold: 0.15,
            lookback: ROLLING_HIGH_DAYS,
        });
        let t = strategy.run(&daily_series(&closes)).unwrap();

        assert!(t.len() >= 6);
        assert!(t.iter().all(|s| s.signal == Some(false)));
        assert!(t.contributions().iter().all(|&c| c == 50.0));
    }

    #[test]
    fn double_down_doubles_after_warmup() {
        // flat at 100 for 260 days, then 70 for the rest
        let mut closes = vec![100.0; 260];
        closes.extend(vec![70.0; 100]);
        let strategy = Strategy::DoubleDownDca(DoubleDownParams {
            monthly_contrib: 10.0,
            threshold: 0.2,
            lookback: ROLLING_HIGH_DAYS,
        });
        let t = strategy.run(&daily_series(&closes)).unwrap();

        let contributions = t.contributions();
        for (state, c) in t.iter().zip(&contributions) {
            if state.close == 70.0 {
                assert_eq!(state.signal, Some(true));
                assert_eq!(*c, 20.0);
            } else {
                assert_eq!(*c, 10.0);
            }
        }
        assert!(contributions.contains(&20.0));
    }

    #[test]
    fn lump_sum_invests_everything_up_front() {
        let strategy = Strategy::LumpSum(LumpSumParams {
            monthly_contrib: 100.0,
        });
        let t = strategy.simulate(&monthly(&[10.0, 20.0, 25.0, 5.0])).unwrap();

        for s in &t {
            assert_eq!(s.invested_total, 400.0);
            assert_eq!(s.shares_total, 40.0);
        }
        assert_eq!(t.last().unwrap().portf_value, 200.0);
        assert_eq!(t.last().unwrap().profit_loss, -200.0);
    }

    #[test]
    fn sma_momentum_skips_contribution_without_signal() {
        let strategy = Strategy::SmaMomentum(SmaParams {
            monthly_contrib: 100.0,
            window: 3,
        });
        let obs = with_signals(monthly(&[10.0, 20.0, 25.0]), &[false, true, false]);
        let t = strategy.simulate(&obs).unwrap();

        assert_eq!(t.len(), 3);
        assert_eq!(t.contributions(), vec![0.0, 100.0, 0.0]);
        assert_eq!(t.states()[2].shares_total, 5.0);
        assert_eq!(t.states()[2].portf_value, 125.0);
    }

    #[test]
    fn sma_variants_are_mirror_images() {
        // rising then falling price: momentum buys in the rise, reversion in the fall
        let mut closes: Vec<f64> = (0..120).map(|i| 50.0 + i as f64).collect();
        closes.extend((0..120).map(|i| 170.0 - i as f64));
        let series = daily_series(&closes);

        let params = SmaParams {
            monthly_contrib: 10.0,
            window: 20,
        };
        let mom = Strategy::SmaMomentum(params).run(&series).unwrap();
        let rev = Strategy::SmaMeanReversion(params).run(&series).unwrap();

        assert_eq!(mom.len(), rev.len());
        // first month is inside the warm-up: neither invests
        assert_eq!(mom.states()[0].signal, Some(false));
        assert_eq!(rev.states()[0].signal, Some(false));
        for (m, r) in mom.iter().zip(&rev).skip(1) {
            assert_ne!(m.signal, r.signal, "on {}", m.trade_date);
        }
    }

    #[test]
    fn value_averaging_closes_gap_to_goal() {
        let strategy = Strategy::ValueAveraging(ValueAveragingParams {
            monthly_contrib: 100.0,
            monthly_growth: 0.0,
        });
        let t = strategy.simulate(&monthly(&[10.0, 10.0, 20.0])).unwrap();

        // goals 100, 200, 300; month 2 holds 20 shares worth 400 > 300
        assert_eq!(t.contributions(), vec![100.0, 100.0, 0.0]);
        assert_eq!(t.last().unwrap().portf_value, 400.0);
    }

    #[test]
    fn value_averaging_goal_path() {
        assert_relative_eq!(value_averaging_goal(100.0, 0.006, 0), 100.0);
        assert_relative_eq!(value_averaging_goal(100.0, 0.006, 1), 201.2, epsilon = 1e-9);
        assert_relative_eq!(
            value_averaging_goal(100.0, 0.006, 12),
            1300.0 * 1.006_f64.powi(12),
            epsilon = 1e-9
        );
    }

    #[test]
    fn value_averaging_contribution_never_negative() {
        let strategy = Strategy::ValueAveraging(ValueAveragingParams::default());
        let t = strategy
            .simulate(&monthly(&[10.0, 40.0, 80.0, 160.0, 5.0]))
            .unwrap();
        assert!(t.contributions().iter().all(|&c| c >= 0.0));
    }

    #[test]
    fn validation_rejects_bad_params() {
        let bad = [
            Strategy::StandardDca(StandardDcaParams {
                monthly_contrib: -1.0,
            }),
            Strategy::DoubleDownDca(DoubleDownParams {
                threshold: 0.0,
                ..DoubleDownParams::default()
            }),
            Strategy::DoubleDownDca(DoubleDownParams {
                threshold: 1.0,
                ..DoubleDownParams::default()
            }),
            Strategy::DoubleDownDca(DoubleDownParams {
                lookback: 0,
                ..DoubleDownParams::default()
            }),
            Strategy::SmaMomentum(SmaParams {
                window: 0,
                ..SmaParams::default()
            }),
            Strategy::SmaMeanReversion(SmaParams {
                monthly_contrib: f64::NAN,
                ..SmaParams::default()
            }),
            Strategy::ValueAveraging(ValueAveragingParams {
                monthly_growth: -1.0,
                ..ValueAveragingParams::default()
            }),
        ];
        for strategy in bad {
            let err = strategy.simulate(&monthly(&[10.0])).unwrap_err();
            assert!(matches!(err, DcaError::Config { .. }), "{strategy:?}");
        }
    }

    #[test]
    fn config_error_precedes_data_error() {
        let strategy = Strategy::StandardDca(StandardDcaParams {
            monthly_contrib: -5.0,
        });
        let err = strategy.run(&PriceSeries::default()).unwrap_err();
        assert!(matches!(err, DcaError::Config { .. }));
    }

    #[test]
    fn empty_series_is_data_error() {
        let strategy = Strategy::StandardDca(StandardDcaParams::default());
        let err = strategy.run(&PriceSeries::default()).unwrap_err();
        assert!(matches!(err, DcaError::Data { .. }));
    }

    #[test]
    fn zero_first_close_is_computation_error() {
        let strategy = Strategy::LumpSum(LumpSumParams::default());
        let err = strategy.simulate(&monthly(&[0.0, 10.0])).unwrap_err();
        assert!(matches!(err, DcaError::Computation { .. }));
    }
}
