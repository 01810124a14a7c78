//! CSV file price data adapter.
//!
//! Serves bars from a directory of `{SYMBOL}.csv` files with the columns
//! `date,open,high,low,close,volume`. Doubles as the loader for the `import`
//! command, which reads one such file and hands the bars to the SQLite store.

use crate::domain::bar::PriceBar;
use crate::domain::error::StocklensError;
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

/// Parse one CSV file of daily bars for `symbol`. Rows keep file order;
/// callers needing ascending dates sort afterwards (the port impl does).
pub fn read_bars_from_file(path: &Path, symbol: &str) -> Result<Vec<PriceBar>, StocklensError> {
    let content = fs::read_to_string(path).map_err(|e| StocklensError::ProviderUnavailable {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let parse_err = |what: &str, detail: String| StocklensError::ProviderUnavailable {
        reason: format!("{}: {} in {}", what, detail, path.display()),
    };

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| parse_err("CSV parse error", e.to_string()))?;

        let get = |i: usize, name: &str| {
            record
                .get(i)
                .ok_or_else(|| parse_err("missing column", name.to_string()))
        };

        let date = NaiveDate::parse_from_str(get(0, "date")?, "%Y-%m-%d")
            .map_err(|e| parse_err("invalid date", e.to_string()))?;
        let open: f64 = get(1, "open")?
            .parse()
            .map_err(|e: std::num::ParseFloatError| parse_err("invalid open", e.to_string()))?;
        let high: f64 = get(2, "high")?
            .parse()
            .map_err(|e: std::num::ParseFloatError| parse_err("invalid high", e.to_string()))?;
        let low: f64 = get(3, "low")?
            .parse()
            .map_err(|e: std::num::ParseFloatError| parse_err("invalid low", e.to_string()))?;
        let close: f64 = get(4, "close")?
            .parse()
            .map_err(|e: std::num::ParseFloatError| parse_err("invalid close", e.to_string()))?;
        let volume: i64 = get(5, "volume")?
            .parse()
            .map_err(|e: std::num::ParseIntError| parse_err("invalid volume", e.to_string()))?;

        bars.push(PriceBar {
            symbol: symbol.to_string(),
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    Ok(bars)
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_sorted(&self, symbol: &str) -> Result<Vec<PriceBar>, StocklensError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Err(StocklensError::InvalidSymbol {
                symbol: symbol.to_string(),
            });
        }

        let mut bars = read_bars_from_file(&path, symbol)?;
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Ok(bars)
    }
}

impl PriceDataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StocklensError> {
        let bars = self.read_sorted(symbol)?;
        Ok(bars
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect())
    }

    fn fetch_all_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, StocklensError> {
        self.read_sorted(symbol)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StocklensError> {
        let entries =
            fs::read_dir(&self.base_path).map_err(|e| StocklensError::ProviderUnavailable {
                reason: format!("failed to read directory {}: {}", self.base_path.display(), e),
            })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StocklensError::ProviderUnavailable {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StocklensError> {
        let bars = match self.read_sorted(symbol) {
            Ok(bars) => bars,
            Err(StocklensError::InvalidSymbol { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, bars.len()))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("IBM.csv"), csv_content).unwrap();
        fs::write(path.join("MSFT.csv"), "date,open,high,low,close,volume\n").unwrap();

        (dir, path)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fetch_bars_parses_rows() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter
            .fetch_bars("IBM", date(2024, 1, 15), date(2024, 1, 17))
            .unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, date(2024, 1, 15));
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[0].symbol, "IBM");
    }

    #[test]
    fn fetch_bars_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter
            .fetch_bars("IBM", date(2024, 1, 16), date(2024, 1, 16))
            .unwrap();

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date(2024, 1, 16));
    }

    #[test]
    fn unknown_symbol_is_invalid() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_all_bars("XYZ").unwrap_err();
        assert!(matches!(
            err,
            StocklensError::InvalidSymbol { ref symbol } if symbol == "XYZ"
        ));
    }

    #[test]
    fn unsorted_file_comes_back_ascending() {
        let dir = TempDir::new().unwrap();
        let content = "date,open,high,low,close,volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n";
        fs::write(dir.path().join("IBM.csv"), content).unwrap();

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let bars = adapter.fetch_all_bars("IBM").unwrap();
        assert_eq!(bars[0].date, date(2024, 1, 15));
        assert_eq!(bars[1].date, date(2024, 1, 17));
    }

    #[test]
    fn duplicate_dates_are_deduplicated() {
        let dir = TempDir::new().unwrap();
        let content = "date,open,high,low,close,volume\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-15,999.0,999.0,999.0,999.0,1\n";
        fs::write(dir.path().join("IBM.csv"), content).unwrap();

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let bars = adapter.fetch_all_bars("IBM").unwrap();
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn list_symbols_from_directory() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert_eq!(adapter.list_symbols().unwrap(), vec!["IBM", "MSFT"]);
    }

    #[test]
    fn data_range_reports_bounds() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let (min, max, count) = adapter.get_data_range("IBM").unwrap().unwrap();
        assert_eq!(min, date(2024, 1, 15));
        assert_eq!(max, date(2024, 1, 17));
        assert_eq!(count, 3);

        assert!(adapter.get_data_range("MSFT").unwrap().is_none());
        assert!(adapter.get_data_range("XYZ").unwrap().is_none());
    }

    #[test]
    fn malformed_row_is_an_error() {
        let dir = TempDir::new().unwrap();
        let content = "date,open,high,low,close,volume\n\
            2024-01-15,abc,110.0,90.0,105.0,50000\n";
        fs::write(dir.path().join("IBM.csv"), content).unwrap();

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_all_bars("IBM").unwrap_err();
        assert!(matches!(err, StocklensError::ProviderUnavailable { .. }));
    }
}
