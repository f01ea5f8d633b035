//! Price data access port trait.

use crate::domain::error::DcaError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

/// Source of cleaned daily closes. Implementations own fetching, sorting,
/// de-duplication and dropping incomplete rows; the engine only consumes
/// the resulting [`PriceSeries`].
pub trait DataPort {
    /// Closes for `ticker` with `start <= date <= end` (either bound optional).
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, DcaError>;

    fn list_symbols(&self) -> Result<Vec<String>, DcaError>;

    /// First date, last date and row count, or `None` when nothing is stored.
    fn get_data_range(&self, ticker: &str)
        -> Result<Option<(NaiveDate, NaiveDate, usize)>, DcaError>;
}
