//! Performance metrics over a finished trajectory.
//!
//! All percentages are returned as plain numbers (`12.5` means 12.5%);
//! formatting for display is left to the report adapters.

use serde::Serialize;

use super::error::DcaError;
use super::trajectory::PortfolioTrajectory;

const DAYS_PER_YEAR: f64 = 365.0;
const MONTHS_PER_YEAR: i32 = 12;

const IRR_MAX_ITERATIONS: usize = 100;
const IRR_TOLERANCE: f64 = 1e-12;
const BISECTION_ITERATIONS: usize = 200;
/// Monthly rates probed for a sign change when Newton's method fails.
const BRACKET_GRID: [f64; 16] = [
    -0.99, -0.9, -0.75, -0.5, -0.25, -0.1, -0.05, 0.0, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsReport {
    pub total_invested: f64,
    pub final_value: f64,
    pub roi_pct: f64,
    pub irr_annual_pct: f64,
    pub cagr_pct: f64,
    pub max_drawdown_pct: f64,
    pub calmar_ratio: f64,
    pub years: f64,
}

impl MetricsReport {
    /// Derive the full report. Fails as a whole if any metric is undefined;
    /// the individual functions below can be used for partial results.
    pub fn compute(trajectory: &PortfolioTrajectory) -> Result<Self, DcaError> {
        check_trajectory(trajectory)?;

        let years = years(trajectory)?;
        let cagr_pct = cagr_pct(trajectory)?;
        let max_drawdown_pct = max_drawdown_pct(trajectory);

        Ok(MetricsReport {
            total_invested: trajectory.final_invested(),
            final_value: trajectory.final_value(),
            roi_pct: roi_pct(trajectory)?,
            irr_annual_pct: irr_annual_pct(trajectory)?,
            cagr_pct,
            max_drawdown_pct,
            calmar_ratio: calmar_ratio(cagr_pct, max_drawdown_pct)?,
            years,
        })
    }
}

/// Every metric that can be derived from a trajectory, `None` for the rest.
/// Lets a report show a row even when, say, the Calmar ratio is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PartialMetrics {
    pub total_invested: f64,
    pub final_value: f64,
    pub roi_pct: Option<f64>,
    pub irr_annual_pct: Option<f64>,
    pub cagr_pct: Option<f64>,
    pub max_drawdown_pct: f64,
    pub calmar_ratio: Option<f64>,
    pub years: Option<f64>,
}

impl PartialMetrics {
    pub fn compute(trajectory: &PortfolioTrajectory) -> Self {
        let cagr = cagr_pct(trajectory).ok();
        let max_drawdown_pct = max_drawdown_pct(trajectory);
        PartialMetrics {
            total_invested: trajectory.final_invested(),
            final_value: trajectory.final_value(),
            roi_pct: roi_pct(trajectory).ok(),
            irr_annual_pct: irr_annual_pct(trajectory).ok(),
            cagr_pct: cagr,
            max_drawdown_pct,
            calmar_ratio: cagr.and_then(|c| calmar_ratio(c, max_drawdown_pct).ok()),
            years: years(trajectory).ok(),
        }
    }
}

impl From<MetricsReport> for PartialMetrics {
    fn from(r: MetricsReport) -> Self {
        PartialMetrics {
            total_invested: r.total_invested,
            final_value: r.final_value,
            roi_pct: Some(r.roi_pct),
            irr_annual_pct: Some(r.irr_annual_pct),
            cagr_pct: Some(r.cagr_pct),
            max_drawdown_pct: r.max_drawdown_pct,
            calmar_ratio: Some(r.calmar_ratio),
            years: Some(r.years),
        }
    }
}

fn check_trajectory(trajectory: &PortfolioTrajectory) -> Result<(), DcaError> {
    if trajectory.len() < 2 {
        return Err(DcaError::data(format!(
            "need at least 2 periods for metrics, have {}",
            trajectory.len()
        )));
    }
    if trajectory.final_invested() <= 0.0 {
        return Err(DcaError::data("nothing was invested"));
    }
    Ok(())
}

/// `(final_value / final_invested - 1) * 100`
pub fn roi_pct(trajectory: &PortfolioTrajectory) -> Result<f64, DcaError> {
    check_trajectory(trajectory)?;
    Ok((trajectory.final_value() / trajectory.final_invested() - 1.0) * 100.0)
}

/// Calendar days between the first and last period, over 365.
pub fn years(trajectory: &PortfolioTrajectory) -> Result<f64, DcaError> {
    check_trajectory(trajectory)?;
    let (Some(first), Some(last)) = (trajectory.first(), trajectory.last()) else {
        return Err(DcaError::data("trajectory is empty"));
    };
    let years = (last.date - first.date).num_days() as f64 / DAYS_PER_YEAR;
    if years <= 0.0 {
        return Err(DcaError::data(format!(
            "trajectory spans no time ({} to {})",
            first.date, last.date
        )));
    }
    Ok(years)
}

/// Annualized growth of the capital multiple `final_value / final_invested`.
///
/// This is not the textbook CAGR on a fixed starting value: capital goes in
/// every month, so the multiple is spread over the whole horizon even though
/// late contributions were invested for less time. It is comparable across
/// strategies that deploy capital the same way, nothing more.
pub fn cagr_pct(trajectory: &PortfolioTrajectory) -> Result<f64, DcaError> {
    let years = years(trajectory)?;
    let multiple = trajectory.final_value() / trajectory.final_invested();
    let cagr = (multiple.powf(1.0 / years) - 1.0) * 100.0;
    if !cagr.is_finite() {
        return Err(DcaError::metrics(format!(
            "CAGR undefined for multiple {} over {} years",
            multiple, years
        )));
    }
    Ok(cagr)
}

/// Largest fall of portfolio value from its running peak, in percent (<= 0).
///
/// Periods before anything is held (peak of 0) have no drawdown.
pub fn max_drawdown_pct(trajectory: &PortfolioTrajectory) -> f64 {
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;

    for state in trajectory {
        peak = peak.max(state.portf_value);
        if peak > 0.0 {
            let dd = state.portf_value / peak - 1.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd * 100.0
}

/// `cagr_pct / |max_drawdown_pct|`; undefined without a drawdown.
pub fn calmar_ratio(cagr_pct: f64, max_drawdown_pct: f64) -> Result<f64, DcaError> {
    if max_drawdown_pct == 0.0 {
        return Err(DcaError::metrics(
            "calmar ratio undefined: portfolio never drew down",
        ));
    }
    Ok(cagr_pct / max_drawdown_pct.abs())
}

/// Cash flows from the investor's side: each period's contribution as an
/// outflow, with the final value received back in the last period.
pub fn irr_cash_flows(trajectory: &PortfolioTrajectory) -> Vec<f64> {
    let mut flows: Vec<f64> = trajectory.contributions().iter().map(|c| -c).collect();
    if let Some(last) = flows.last_mut() {
        *last += trajectory.final_value();
    }
    flows
}

/// Net present value of `cash_flows` at a per-period `rate`.
pub fn npv(rate: f64, cash_flows: &[f64]) -> f64 {
    npv_and_derivative(rate, cash_flows).0
}

fn npv_and_derivative(rate: f64, cash_flows: &[f64]) -> (f64, f64) {
    let base = 1.0 / (1.0 + rate);
    let mut discount = 1.0;
    let mut value = 0.0;
    let mut derivative = 0.0;
    for (i, cf) in cash_flows.iter().enumerate() {
        value += cf * discount;
        derivative -= i as f64 * cf * discount * base;
        discount *= base;
    }
    (value, derivative)
}

/// Per-period internal rate of return.
///
/// Newton's method from 0, falling back to bisection over a bracket found on
/// a fixed grid. Errors if the flows never change sign (no root) or neither
/// method converges.
pub fn solve_irr(cash_flows: &[f64]) -> Result<f64, DcaError> {
    let has_inflow = cash_flows.iter().any(|&c| c > 0.0);
    let has_outflow = cash_flows.iter().any(|&c| c < 0.0);
    if !(has_inflow && has_outflow) {
        return Err(DcaError::metrics(
            "IRR has no root: cash flows never change sign",
        ));
    }

    if let Some(rate) = newton_irr(cash_flows) {
        return Ok(rate);
    }
    tracing::debug!("newton IRR failed, bisecting");
    bisect_irr(cash_flows).ok_or_else(|| DcaError::metrics("IRR solver did not converge"))
}

fn newton_irr(cash_flows: &[f64]) -> Option<f64> {
    let mut rate = 0.0_f64;
    for _ in 0..IRR_MAX_ITERATIONS {
        let (value, derivative) = npv_and_derivative(rate, cash_flows);
        if !value.is_finite() || !derivative.is_finite() || derivative == 0.0 {
            return None;
        }
        let next = rate - value / derivative;
        if !next.is_finite() || next <= -1.0 {
            return None;
        }
        if (next - rate).abs() <= IRR_TOLERANCE * (1.0 + rate.abs()) {
            return Some(next);
        }
        rate = next;
    }
    None
}

fn bisect_irr(cash_flows: &[f64]) -> Option<f64> {
    let samples: Vec<(f64, f64)> = BRACKET_GRID
        .iter()
        .map(|&r| (r, npv(r, cash_flows)))
        .filter(|(_, v)| v.is_finite())
        .collect();

    let (mut lo, mut f_lo, mut hi) = samples.windows(2).find_map(|w| {
        let ((a, fa), (b, fb)) = (w[0], w[1]);
        if fa == 0.0 {
            Some((a, fa, a))
        } else if fa.signum() != fb.signum() {
            Some((a, fa, b))
        } else {
            None
        }
    })?;

    for _ in 0..BISECTION_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        let f_mid = npv(mid, cash_flows);
        if f_mid == 0.0 || (hi - lo) <= IRR_TOLERANCE {
            return Some(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}

/// Monthly IRR compounded to a yearly rate, in percent.
pub fn irr_annual_pct(trajectory: &PortfolioTrajectory) -> Result<f64, DcaError> {
    check_trajectory(trajectory)?;
    let monthly = solve_irr(&irr_cash_flows(trajectory))?;
    Ok(((1.0 + monthly).powi(MONTHS_PER_YEAR) - 1.0) * 100.0)
}
