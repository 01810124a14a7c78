//! Prediction store port trait.

use crate::domain::error::StocklensError;
use crate::domain::forecast::ForecastRow;
use chrono::NaiveDate;

/// Persisted forecast rows, keyed by (symbol, date, model_type).
///
/// The store follows an insert-if-absent discipline: rows are never
/// overwritten, and `insert` fails with `DuplicateKey` when the key already
/// exists. Implementations must make the existence check and insert
/// race-safe per key (a primary key constraint suffices).
pub trait PredictionStorePort {
    fn exists(
        &self,
        symbol: &str,
        date: NaiveDate,
        model_type: &str,
    ) -> Result<bool, StocklensError>;

    fn insert(&self, row: &ForecastRow) -> Result<(), StocklensError>;

    /// Stored rows for `symbol` and `model_type` within the inclusive date
    /// range, ascending by date.
    fn query(
        &self,
        symbol: &str,
        model_type: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<ForecastRow>, StocklensError>;
}
