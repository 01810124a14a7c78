//! Daily price bar representation.

use chrono::NaiveDate;

/// One day of trading data for a symbol. Immutable once fetched;
/// uniquely keyed by (symbol, date).
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBar {
    /// (open + close) / 2 — the single scalar the trading strategy reacts to.
    pub fn mid_price(&self) -> f64 {
        (self.open + self.close) / 2.0
    }
}
