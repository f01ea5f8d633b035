#![allow(dead_code)]

use chrono::NaiveDate;
use dcasim::domain::error::DcaError;
use dcasim::domain::price::{PricePoint, PriceSeries};
use dcasim::ports::data_port::DataPort;
use proptest::prelude::*;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, ticker: &str, series: PriceSeries) -> Self {
        self.data.insert(ticker.to_string(), series);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, DcaError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(DcaError::data(reason.clone()));
        }
        Ok(self
            .data
            .get(ticker)
            .map(|s| s.between(start_date, end_date))
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, DcaError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, DcaError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(DcaError::data(reason.clone()));
        }
        Ok(self.data.get(ticker).and_then(|s| match (s.first(), s.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, s.len())),
            _ => None,
        }))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily closes from `closes`, one per calendar day starting at `start`.
pub fn series_from_closes(start: &str, closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    PriceSeries::new(
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint::new(start + chrono::Duration::days(i as i64), close))
            .collect(),
    )
    .unwrap()
}

/// Linear price path: `start_price + step * i`.
pub fn generate_series(start: &str, count: usize, start_price: f64, step: f64) -> PriceSeries {
    let closes: Vec<f64> = (0..count).map(|i| start_price + step * i as f64).collect();
    series_from_closes(start, &closes)
}

/// A price path that rises, crashes 40% and recovers.
pub fn crash_and_recovery_series(start: &str) -> PriceSeries {
    let closes: Vec<f64> = (0..900)
        .map(|i| {
            let t = i as f64;
            if i < 300 {
                100.0 + 0.1 * t
            } else if i < 400 {
                130.0 - 0.52 * (t - 300.0)
            } else {
                78.0 + 0.15 * (t - 400.0)
            }
        })
        .collect();
    series_from_closes(start, &closes)
}

/// Random walk of daily closes: between one and five years of days, each
/// step a multiplicative move of at most 5%.
pub fn price_path() -> impl Strategy<Value = PriceSeries> {
    (
        10.0f64..500.0,
        prop::collection::vec(-0.05f64..0.05, 60..1800),
    )
        .prop_map(|(start_price, moves)| {
            let mut close = start_price;
            let closes: Vec<f64> = moves
                .iter()
                .map(|m| {
                    close *= 1.0 + m;
                    close
                })
                .collect();
            series_from_closes("2015-01-02", &closes)
        })
}
