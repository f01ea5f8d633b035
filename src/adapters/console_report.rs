//! Plain-text comparison table printed after a backtest.

use std::fmt::Write as _;

use crate::domain::backtest::{BacktestConfig, StrategyOutcome};
use crate::domain::error::DcaError;
use crate::ports::report_port::ReportPort;

const HEADERS: [&str; 9] = [
    "Strategy",
    "Total Invested",
    "Final Value",
    "ROI",
    "IRR",
    "CAGR",
    "Max Drawdown",
    "Calmar",
    "Years",
];

const NOT_AVAILABLE: &str = "n/a";

pub struct ConsoleReportAdapter;

/// `$1,234.56`, with a leading minus for negative amounts.
pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

pub fn format_pct(value: f64) -> String {
    format!("{:.2}%", value)
}

fn or_na(value: Option<f64>, fmt: impl Fn(f64) -> String) -> String {
    value.map(fmt).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Render the outcomes as an aligned table. Failed runs are listed below
/// the table with their error instead of a row.
pub fn render_comparison(outcomes: &[StrategyOutcome]) -> String {
    let mut rows: Vec<[String; 9]> = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();

    for outcome in outcomes {
        let Some(m) = outcome.partial_metrics() else {
            if let Some(err) = outcome.error() {
                failures.push(format!("{}: {}", outcome.kind.label(), err));
            }
            continue;
        };
        rows.push([
            outcome.kind.label().to_string(),
            format_currency(m.total_invested),
            format_currency(m.final_value),
            or_na(m.roi_pct, format_pct),
            or_na(m.irr_annual_pct, format_pct),
            or_na(m.cagr_pct, format_pct),
            format_pct(m.max_drawdown_pct),
            or_na(m.calmar_ratio, |v| format!("{:.2}", v)),
            or_na(m.years, |v| format!("{:.2}", v)),
        ]);
    }

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    push_row(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }

    if !failures.is_empty() {
        out.push('\n');
        for failure in &failures {
            let _ = writeln!(out, "skipped {}", failure);
        }
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i == 0 {
            let _ = write!(line, "{:<width$}", cell, width = *width);
        } else {
            let _ = write!(line, "  {:>width$}", cell, width = *width);
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

impl ReportPort for ConsoleReportAdapter {
    fn write(
        &self,
        config: &BacktestConfig,
        outcomes: &[StrategyOutcome],
    ) -> Result<(), DcaError> {
        println!("\n=== {} ===", config.ticker);
        print!("{}", render_comparison(outcomes));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::run_comparison;
    use crate::domain::price::{PricePoint, PriceSeries};
    use crate::domain::strategy::{
        LumpSumParams, SmaParams, StandardDcaParams, Strategy,
    };
    use chrono::NaiveDate;

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(150.0), "$150.00");
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_currency(-999.999), "-$1,000.00");
        assert_eq!(format_currency(-0.001), "$0.00");
    }

    #[test]
    fn pct_formatting() {
        assert_eq!(format_pct(12.345), "12.35%");
        assert_eq!(format_pct(-3.0), "-3.00%");
    }

    #[test]
    fn table_lists_runs_and_failures() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let series = PriceSeries::new(
            (0..120)
                .map(|i| PricePoint::new(start + chrono::Duration::days(i), 50.0))
                .collect(),
        )
        .unwrap();
        let outcomes = run_comparison(
            &series,
            &[
                Strategy::StandardDca(StandardDcaParams::default()),
                Strategy::SmaMomentum(SmaParams {
                    window: 0,
                    ..SmaParams::default()
                }),
                Strategy::LumpSum(LumpSumParams::default()),
            ],
        );

        let table = render_comparison(&outcomes);
        let lines: Vec<_> = table.lines().collect();

        assert!(lines[0].starts_with("Strategy"));
        assert!(lines[0].ends_with("Years"));
        assert!(lines[1].starts_with("---"));
        assert!(lines[2].starts_with("DCA "));
        assert!(lines[2].contains("$600.00"));
        // flat prices never draw down, so the Calmar ratio is undefined
        assert!(lines[2].contains("n/a"));
        assert!(lines[3].starts_with("Lump Sum"));
        assert!(table.contains("skipped SMA Momentum: invalid parameter"));
    }

    #[test]
    fn empty_outcomes_render_header_only() {
        let table = render_comparison(&[]);
        assert_eq!(table.lines().count(), 2);
    }
}
