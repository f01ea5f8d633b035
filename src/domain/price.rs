//! Daily closing price series.
//!
//! A [`PriceSeries`] is the engine's only input: ascending unique dates,
//! strictly positive finite closes. [`PriceSeries::new`] checks those
//! invariants; [`PriceSeries::from_unsorted`] is the loader-side cleanup that
//! establishes them from raw rows.

use crate::domain::error::DcaError;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }

    /// A usable close: finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Wrap already-clean points, rejecting anything out of order, duplicated
    /// or with a non-positive close.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, DcaError> {
        for (i, point) in points.iter().enumerate() {
            if !point.is_valid() {
                return Err(DcaError::data(format!(
                    "invalid close {} on {}",
                    point.close, point.date
                )));
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(DcaError::data(format!(
                    "dates not strictly increasing at {}",
                    point.date
                )));
            }
        }
        Ok(Self { points })
    }

    /// Sort, drop invalid closes and keep the first row of each date.
    pub fn from_unsorted(mut points: Vec<PricePoint>) -> Self {
        points.retain(PricePoint::is_valid);
        // stable sort keeps file order within a date
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    #[cfg(test)]
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Points with `start <= date <= end`; either bound may be open.
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let points = self
            .points
            .iter()
            .filter(|p| start.is_none_or(|s| p.date >= s))
            .filter(|p| end.is_none_or(|e| p.date <= e))
            .copied()
            .collect();
        Self { points }
    }
}
