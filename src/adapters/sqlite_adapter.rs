//! SQLite storage adapter.
//!
//! Backs both the price series provider and the prediction store with one
//! pooled database. Dates are stored as `%Y-%m-%d` text; primary keys give
//! the (symbol, date) and (symbol, date, model_type) uniqueness guarantees,
//! which also makes the prediction check-and-insert race-safe.

use crate::domain::bar::PriceBar;
use crate::domain::error::StocklensError;
use crate::domain::forecast::ForecastRow;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::prediction_port::PredictionStorePort;
use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

const DATE_FMT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_err(e: r2d2::Error) -> StocklensError {
    StocklensError::ProviderUnavailable {
        reason: e.to_string(),
    }
}

fn sql_err(e: rusqlite::Error) -> StocklensError {
    StocklensError::ProviderUnavailable {
        reason: e.to_string(),
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(date_str, DATE_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            date_str.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StocklensError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| StocklensError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, StocklensError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), StocklensError> {
        let conn = self.pool.get().map_err(pool_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS price_bars (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (symbol, date)
            );
            CREATE INDEX IF NOT EXISTS idx_price_bars_date ON price_bars(date);
            CREATE TABLE IF NOT EXISTS predictions (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                model_type TEXT NOT NULL,
                PRIMARY KEY (symbol, date, model_type)
            );",
        )
        .map_err(sql_err)?;

        Ok(())
    }

    /// Store a batch of bars. Rows dated before `retention_floor` and rows
    /// whose (symbol, date) already exists are skipped; the rest of the batch
    /// still goes in. Returns the number of rows actually inserted.
    pub fn insert_bars(
        &self,
        bars: &[PriceBar],
        retention_floor: Option<NaiveDate>,
    ) -> Result<usize, StocklensError> {
        let mut conn = self.pool.get().map_err(pool_err)?;
        let tx = conn.transaction().map_err(sql_err)?;

        let mut inserted = 0;
        for bar in bars {
            if retention_floor.is_some_and(|floor| bar.date < floor) {
                continue;
            }

            let changed = tx
                .execute(
                    "INSERT OR IGNORE INTO price_bars
                     (symbol, date, open, high, low, close, volume)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        bar.symbol,
                        bar.date.format(DATE_FMT).to_string(),
                        bar.open,
                        bar.high,
                        bar.low,
                        bar.close,
                        bar.volume
                    ],
                )
                .map_err(sql_err)?;
            inserted += changed;
        }

        tx.commit().map_err(sql_err)?;
        Ok(inserted)
    }

    fn select_bars(
        &self,
        query: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<PriceBar>, StocklensError> {
        let conn = self.pool.get().map_err(pool_err)?;
        let mut stmt = conn.prepare(query).map_err(sql_err)?;

        let rows = stmt
            .query_map(params, |row| {
                let date_str: String = row.get(1)?;
                Ok(PriceBar {
                    symbol: row.get(0)?,
                    date: parse_date(&date_str)?,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    volume: row.get(6)?,
                })
            })
            .map_err(sql_err)?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(row.map_err(sql_err)?);
        }
        Ok(bars)
    }
}

impl PriceDataPort for SqliteAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StocklensError> {
        self.select_bars(
            "SELECT symbol, date, open, high, low, close, volume
             FROM price_bars
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
            &[
                &symbol,
                &start_date.format(DATE_FMT).to_string(),
                &end_date.format(DATE_FMT).to_string(),
            ],
        )
    }

    fn fetch_all_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, StocklensError> {
        self.select_bars(
            "SELECT symbol, date, open, high, low, close, volume
             FROM price_bars
             WHERE symbol = ?1
             ORDER BY date ASC",
            &[&symbol],
        )
    }

    fn list_symbols(&self) -> Result<Vec<String>, StocklensError> {
        let conn = self.pool.get().map_err(pool_err)?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM price_bars ORDER BY symbol")
            .map_err(sql_err)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(sql_err)?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row.map_err(sql_err)?);
        }
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StocklensError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM price_bars WHERE symbol = ?1",
                params![symbol],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(sql_err)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let min = NaiveDate::parse_from_str(&min_str, DATE_FMT)
                    .map_err(|e| StocklensError::ProviderUnavailable {
                        reason: e.to_string(),
                    })?;
                let max = NaiveDate::parse_from_str(&max_str, DATE_FMT)
                    .map_err(|e| StocklensError::ProviderUnavailable {
                        reason: e.to_string(),
                    })?;
                Ok(Some((min, max, count as usize)))
            }
            _ => Ok(None),
        }
    }
}

impl PredictionStorePort for SqliteAdapter {
    fn exists(
        &self,
        symbol: &str,
        date: NaiveDate,
        model_type: &str,
    ) -> Result<bool, StocklensError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM predictions
                 WHERE symbol = ?1 AND date = ?2 AND model_type = ?3",
                params![symbol, date.format(DATE_FMT).to_string(), model_type],
                |row| row.get(0),
            )
            .map_err(sql_err)?;

        Ok(count > 0)
    }

    fn insert(&self, row: &ForecastRow) -> Result<(), StocklensError> {
        let conn = self.pool.get().map_err(pool_err)?;

        conn.execute(
            "INSERT INTO predictions
             (symbol, date, open, high, low, close, volume, model_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.symbol,
                row.date.format(DATE_FMT).to_string(),
                row.open,
                row.high,
                row.low,
                row.close,
                row.volume,
                row.model_type
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StocklensError::DuplicateKey {
                    symbol: row.symbol.clone(),
                    date: row.date,
                    model_type: row.model_type.clone(),
                }
            }
            other => sql_err(other),
        })?;

        Ok(())
    }

    fn query(
        &self,
        symbol: &str,
        model_type: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<ForecastRow>, StocklensError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let start = start_date
            .map(|d| d.format(DATE_FMT).to_string())
            .unwrap_or_else(|| "0000-01-01".to_string());
        let end = end_date
            .map(|d| d.format(DATE_FMT).to_string())
            .unwrap_or_else(|| "9999-12-31".to_string());

        let mut stmt = conn
            .prepare(
                "SELECT symbol, date, open, high, low, close, volume, model_type
                 FROM predictions
                 WHERE symbol = ?1 AND model_type = ?2 AND date >= ?3 AND date <= ?4
                 ORDER BY date ASC",
            )
            .map_err(sql_err)?;

        let rows = stmt
            .query_map(params![symbol, model_type, start, end], |row| {
                let date_str: String = row.get(1)?;
                Ok(ForecastRow {
                    symbol: row.get(0)?,
                    date: parse_date(&date_str)?,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    volume: row.get(6)?,
                    model_type: row.get(7)?,
                })
            })
            .map_err(sql_err)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(sql_err)?);
        }
        Ok(out)
    }
}
