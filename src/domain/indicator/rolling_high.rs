//! Rolling high: maximum close over a trailing window of trading days.
//!
//! HIGH(n)[i] = max(C[i-j] for j in 0..n)
//! Warmup: first (n-1) points have no value. Callers decide what an
//! undefined high means for them; nothing here substitutes a partial window.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price::PricePoint;

pub fn calculate_rolling_high(points: &[PricePoint], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(points.len());

    for (i, point) in points.iter().enumerate() {
        let value = if period > 0 && i + 1 >= period {
            let window = &points[i + 1 - period..=i];
            Some(
                window
                    .iter()
                    .fold(f64::NEG_INFINITY, |acc, p| acc.max(p.close)),
            )
        } else {
            None
        };

        values.push(IndicatorPoint {
            date: point.date,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::RollingHigh(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_points(prices: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                close,
            })
            .collect()
    }

    #[test]
    fn rolling_high_values() {
        let points = make_points(&[5.0, 3.0, 8.0, 2.0, 7.0, 1.0, 9.0]);
        let series = calculate_rolling_high(&points, 3);

        assert_eq!(series.value_at(0), None);
        assert_eq!(series.value_at(1), None);
        assert_eq!(series.value_at(2), Some(8.0)); // max(5, 3, 8)
        assert_eq!(series.value_at(3), Some(8.0)); // max(3, 8, 2)
        assert_eq!(series.value_at(4), Some(8.0)); // max(8, 2, 7)
        assert_eq!(series.value_at(5), Some(7.0)); // max(2, 7, 1)
        assert_eq!(series.value_at(6), Some(9.0)); // max(7, 1, 9)
    }

    #[test]
    fn rolling_high_252_warmup() {
        let prices: Vec<f64> = (0..300).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rolling_high(&make_points(&prices), 252);

        assert_eq!(series.warmup_len(), 251);
        assert_eq!(series.value_at(251), Some(351.0));
    }

    #[test]
    fn rolling_high_window_drops_old_peak() {
        let points = make_points(&[50.0, 10.0, 10.0, 10.0]);
        let series = calculate_rolling_high(&points, 2);
        assert_eq!(series.value_at(1), Some(50.0));
        assert_eq!(series.value_at(2), Some(10.0));
    }
}
