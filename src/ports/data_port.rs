//! Price series provider port trait.

use crate::domain::bar::PriceBar;
use crate::domain::error::StocklensError;
use chrono::NaiveDate;

/// Supplies daily price bars, ascending by date, unique per (symbol, date).
pub trait PriceDataPort {
    /// Bars for `symbol` with `start_date <= date <= end_date`.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StocklensError>;

    /// Every stored bar for `symbol`.
    fn fetch_all_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, StocklensError>;

    fn list_symbols(&self) -> Result<Vec<String>, StocklensError>;

    /// (earliest, latest, bar count) for `symbol`, or `None` when no data.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StocklensError>;
}
