//! Simple Moving Average of closing prices.
//!
//! SMA(n)[i] = sum(C[i-j] for j in 0..n) / n
//! Warmup: first (n-1) points have no value.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price::PricePoint;

pub fn calculate_sma(points: &[PricePoint], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(points.len());

    for (i, point) in points.iter().enumerate() {
        let value = if period > 0 && i + 1 >= period {
            let window = &points[i + 1 - period..=i];
            Some(window.iter().map(|p| p.close).sum::<f64>() / period as f64)
        } else {
            None
        };

        values.push(IndicatorPoint {
            date: point.date,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
