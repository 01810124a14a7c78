#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::cell::RefCell;
use std::collections::HashMap;
use stocklens::domain::bar::PriceBar;
use stocklens::domain::error::StocklensError;
use stocklens::domain::forecast::ForecastRow;
use stocklens::domain::report::ReportBundle;
use stocklens::ports::data_port::PriceDataPort;
use stocklens::ports::prediction_port::PredictionStorePort;
use stocklens::ports::report_port::ReportPort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, day: &str, close: f64) -> PriceBar {
    PriceBar {
        symbol: symbol.to_string(),
        date: NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
        open: close,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

/// `count` consecutive daily bars starting at `start`, close walking from
/// `start_price` by `step` per day. Open equals close so `mid_price` is the
/// close.
pub fn generate_bars(
    symbol: &str,
    start: NaiveDate,
    count: usize,
    start_price: f64,
    step: f64,
) -> Vec<PriceBar> {
    (0..count)
        .map(|i| {
            let close = start_price + step * i as f64;
            PriceBar {
                symbol: symbol.to_string(),
                date: start + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000 + i as i64,
            }
        })
        .collect()
}

/// In-memory price data port. Records every ranged fetch so tests can assert
/// the window a pipeline asked for.
pub struct MockPriceDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
    pub fetches: RefCell<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl MockPriceDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fetches: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, symbol: &str, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn check_error(&self, symbol: &str) -> Result<(), StocklensError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StocklensError::ProviderUnavailable {
                reason: reason.clone(),
            });
        }
        Ok(())
    }
}

impl PriceDataPort for MockPriceDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StocklensError> {
        self.check_error(symbol)?;
        self.fetches
            .borrow_mut()
            .push((symbol.to_string(), start_date, end_date));

        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn fetch_all_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, StocklensError> {
        self.check_error(symbol)?;
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, StocklensError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StocklensError> {
        self.check_error(symbol)?;
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => Ok(Some((
                bars[0].date,
                bars[bars.len() - 1].date,
                bars.len(),
            ))),
            _ => Ok(None),
        }
    }
}

/// In-memory prediction store with the same (symbol, date, model_type)
/// uniqueness the database adapters enforce.
pub struct MockPredictionStore {
    pub rows: RefCell<Vec<ForecastRow>>,
}

impl MockPredictionStore {
    pub fn new() -> Self {
        Self {
            rows: RefCell::new(Vec::new()),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.borrow().len()
    }
}

impl PredictionStorePort for MockPredictionStore {
    fn exists(
        &self,
        symbol: &str,
        date: NaiveDate,
        model_type: &str,
    ) -> Result<bool, StocklensError> {
        Ok(self
            .rows
            .borrow()
            .iter()
            .any(|r| r.symbol == symbol && r.date == date && r.model_type == model_type))
    }

    fn insert(&self, row: &ForecastRow) -> Result<(), StocklensError> {
        if self.exists(&row.symbol, row.date, &row.model_type)? {
            return Err(StocklensError::DuplicateKey {
                symbol: row.symbol.clone(),
                date: row.date,
                model_type: row.model_type.clone(),
            });
        }
        self.rows.borrow_mut().push(row.clone());
        Ok(())
    }

    fn query(
        &self,
        symbol: &str,
        model_type: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<ForecastRow>, StocklensError> {
        let mut out: Vec<ForecastRow> = self
            .rows
            .borrow()
            .iter()
            .filter(|r| {
                r.symbol == symbol
                    && r.model_type == model_type
                    && start_date.is_none_or(|s| r.date >= s)
                    && end_date.is_none_or(|e| r.date <= e)
            })
            .cloned()
            .collect();
        out.sort_by_key(|r| r.date);
        Ok(out)
    }
}

/// Report port that captures the bundles it was asked to write.
pub struct CollectingReportPort {
    pub written: RefCell<Vec<(ReportBundle, String)>>,
}

impl CollectingReportPort {
    pub fn new() -> Self {
        Self {
            written: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for CollectingReportPort {
    fn write(&self, bundle: &ReportBundle, output_path: &str) -> Result<(), StocklensError> {
        self.written
            .borrow_mut()
            .push((bundle.clone(), output_path.to_string()));
        Ok(())
    }
}
