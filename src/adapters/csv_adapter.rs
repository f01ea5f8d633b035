//! Local CSV price file adapter.
//!
//! One file per ticker, `<base_path>/<TICKER>.csv`, with a header row that
//! contains a `Date` and a `Close` column (any case, any other columns
//! ignored). This matches the daily downloads most market-data tools export.

use crate::domain::error::DcaError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker.to_uppercase()))
    }

    /// Rows with a usable close, unsorted and not deduplicated, plus the
    /// number of rows dropped for a missing or unusable close.
    fn read_points(&self, ticker: &str) -> Result<(Vec<PricePoint>, usize), DcaError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| {
            DcaError::data(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers()?.clone();
        let date_col = find_column(&headers, "date").ok_or_else(|| {
            DcaError::data(format!("{}: missing Date column", path.display()))
        })?;
        let close_col = find_column(&headers, "close").ok_or_else(|| {
            DcaError::data(format!("{}: missing Close column", path.display()))
        })?;

        let mut points = Vec::new();
        let mut skipped = 0usize;

        for result in rdr.records() {
            let record = result?;

            let date_str = record.get(date_col).unwrap_or_default().trim();
            let date = parse_date(date_str).ok_or_else(|| {
                DcaError::data(format!(
                    "{}: invalid date '{}'",
                    path.display(),
                    date_str
                ))
            })?;

            // rows without a usable close are incomplete, not errors
            let close = record.get(close_col).unwrap_or_default().trim().parse::<f64>();
            match close.map(|close| PricePoint { date, close }) {
                Ok(point) if point.is_valid() => points.push(point),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!(ticker, skipped, "dropped rows without a usable close");
        }
        Ok((points, skipped))
    }
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// Accepts `YYYY-MM-DD` optionally followed by a time part.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let day = value.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, DcaError> {
        let (raw, skipped) = self.read_points(ticker)?;
        let rows = raw.len() + skipped;
        let series = PriceSeries::from_unsorted(raw).between(start_date, end_date);
        tracing::debug!(ticker, rows, kept = series.len(), "loaded price file");
        Ok(series)
    }

    fn list_symbols(&self) -> Result<Vec<String>, DcaError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            DcaError::data(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                symbols.push(stem.to_string_lossy().to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, DcaError> {
        if !self.csv_path(ticker).exists() {
            return Ok(None);
        }
        let series = self.fetch_prices(ticker, None, None)?;
        Ok(match (series.first(), series.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, series.len())),
            _ => None,
        })
    }
}
