//! Trailing-window indicators over the daily close series.
//!
//! - `IndicatorPoint`: one value per trading day, `None` during warm-up
//! - `IndicatorType`: indicator identity + window length
//! - `IndicatorSeries`: a full series aligned 1:1 with the price series
//!
//! Every window is trailing and includes the current day, so a value at
//! index `i` only ever reads closes `0..=i`.

pub mod rolling_high;
pub mod sma;

use chrono::NaiveDate;
use std::fmt;

pub use rolling_high::calculate_rolling_high;
pub use sma::calculate_sma;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    RollingHigh(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(|p| p.value)
    }

    /// Date of the first point that carries a value.
    pub fn first_valid_date(&self) -> Option<NaiveDate> {
        self.values.iter().find(|p| p.value.is_some()).map(|p| p.date)
    }

    /// Number of leading points without a value.
    pub fn warmup_len(&self) -> usize {
        self.values.iter().take_while(|p| p.value.is_none()).count()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::RollingHigh(period) => write!(f, "HIGH({})", period),
        }
    }
}
