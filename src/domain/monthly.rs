//! Monthly sampling of a daily price series.
//!
//! One observation per calendar month present in the series, taken on the
//! first trading day on or after the 1st. Signals are evaluated on the daily
//! series and read off at the sampled day, so a month never sees prices from
//! later in that month.

use crate::domain::error::DcaError;
use crate::domain::price::PriceSeries;
use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyObservation {
    /// First calendar day of the month; the period label.
    pub month: NaiveDate,
    /// The trading day actually sampled.
    pub trade_date: NaiveDate,
    pub close: f64,
    /// Position of `trade_date` in the daily series.
    pub day_index: usize,
    /// Strategy condition on `trade_date`, when the strategy has one.
    pub signal: Option<bool>,
}

pub fn sample_monthly(series: &PriceSeries) -> Result<Vec<MonthlyObservation>, DcaError> {
    sample(series, None)
}

/// Like [`sample_monthly`], attaching `daily_signal[day_index]` to each month.
/// `daily_signal` must be aligned 1:1 with the series.
pub fn sample_monthly_with_signal(
    series: &PriceSeries,
    daily_signal: &[bool],
) -> Result<Vec<MonthlyObservation>, DcaError> {
    if daily_signal.len() != series.len() {
        return Err(DcaError::data(format!(
            "signal has {} points, series has {}",
            daily_signal.len(),
            series.len()
        )));
    }
    sample(series, Some(daily_signal))
}

fn sample(
    series: &PriceSeries,
    daily_signal: Option<&[bool]>,
) -> Result<Vec<MonthlyObservation>, DcaError> {
    if series.is_empty() {
        return Err(DcaError::data("price series is empty"));
    }

    let mut observations: Vec<MonthlyObservation> = Vec::new();

    for (i, point) in series.points().iter().enumerate() {
        let month = month_start(point.date)?;
        if observations.last().is_some_and(|o| o.month == month) {
            continue;
        }
        observations.push(MonthlyObservation {
            month,
            trade_date: point.date,
            close: point.close,
            day_index: i,
            signal: daily_signal.map(|s| s[i]),
        });
    }

    tracing::debug!(
        days = series.len(),
        months = observations.len(),
        "sampled monthly observations"
    );

    Ok(observations)
}

fn month_start(date: NaiveDate) -> Result<NaiveDate, DcaError> {
    date.with_day(1)
        .ok_or_else(|| DcaError::data(format!("cannot derive month start of {}", date)))
}
