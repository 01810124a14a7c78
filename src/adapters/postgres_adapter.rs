//! PostgreSQL storage adapter.
//!
//! Same two tables as the SQLite adapter, with native DATE columns and a
//! unique-violation mapped to `DuplicateKey` on prediction insert.

use crate::domain::bar::PriceBar;
use crate::domain::error::StocklensError;
use crate::domain::forecast::ForecastRow;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::prediction_port::PredictionStorePort;
use chrono::NaiveDate;
use postgres::error::SqlState;
use postgres::types::ToSql;
use postgres::NoTls;
use r2d2::Pool;
use r2d2_postgres::PostgresConnectionManager;

pub struct PostgresAdapter {
    pool: Pool<PostgresConnectionManager<NoTls>>,
}

fn pool_err(e: r2d2::Error) -> StocklensError {
    StocklensError::ProviderUnavailable {
        reason: e.to_string(),
    }
}

fn pg_err(e: postgres::Error) -> StocklensError {
    StocklensError::ProviderUnavailable {
        reason: e.to_string(),
    }
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StocklensError> {
        let connection_string = config
            .get_string("postgres", "connection_string")
            .or_else(|| config.get_string("database", "conninfo"))
            .ok_or_else(|| StocklensError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let pool_size = config.get_int("postgres", "pool_size", 4) as u32;

        let pg_config = connection_string.parse().map_err(pg_err)?;
        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), StocklensError> {
        let mut conn = self.pool.get().map_err(pool_err)?;

        conn.batch_execute(
            "CREATE TABLE IF NOT EXISTS price_bars (
                symbol TEXT NOT NULL,
                date DATE NOT NULL,
                open DOUBLE PRECISION NOT NULL,
                high DOUBLE PRECISION NOT NULL,
                low DOUBLE PRECISION NOT NULL,
                close DOUBLE PRECISION NOT NULL,
                volume BIGINT NOT NULL,
                PRIMARY KEY (symbol, date)
            );
            CREATE INDEX IF NOT EXISTS idx_price_bars_date ON price_bars(date);
            CREATE TABLE IF NOT EXISTS predictions (
                symbol TEXT NOT NULL,
                date DATE NOT NULL,
                open DOUBLE PRECISION NOT NULL,
                high DOUBLE PRECISION NOT NULL,
                low DOUBLE PRECISION NOT NULL,
                close DOUBLE PRECISION NOT NULL,
                volume BIGINT NOT NULL,
                model_type TEXT NOT NULL,
                PRIMARY KEY (symbol, date, model_type)
            );",
        )
        .map_err(pg_err)?;

        Ok(())
    }

    /// Store a batch of bars, skipping rows before `retention_floor` and rows
    /// whose (symbol, date) already exists. Returns the number inserted.
    pub fn insert_bars(
        &self,
        bars: &[PriceBar],
        retention_floor: Option<NaiveDate>,
    ) -> Result<usize, StocklensError> {
        let mut conn = self.pool.get().map_err(pool_err)?;
        let mut tx = conn.transaction().map_err(pg_err)?;

        let mut inserted = 0;
        for bar in bars {
            if retention_floor.is_some_and(|floor| bar.date < floor) {
                continue;
            }

            let changed = tx
                .execute(
                    "INSERT INTO price_bars (symbol, date, open, high, low, close, volume)
                     VALUES ($1, $2, $3, $4, $5, $6, $7)
                     ON CONFLICT (symbol, date) DO NOTHING",
                    &[
                        &bar.symbol,
                        &bar.date,
                        &bar.open,
                        &bar.high,
                        &bar.low,
                        &bar.close,
                        &bar.volume,
                    ],
                )
                .map_err(pg_err)?;
            inserted += changed as usize;
        }

        tx.commit().map_err(pg_err)?;
        Ok(inserted)
    }

    fn select_bars(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<PriceBar>, StocklensError> {
        let mut conn = self.pool.get().map_err(pool_err)?;
        let rows = conn.query(query, params).map_err(pg_err)?;

        Ok(rows
            .into_iter()
            .map(|row| PriceBar {
                symbol: row.get(0),
                date: row.get(1),
                open: row.get(2),
                high: row.get(3),
                low: row.get(4),
                close: row.get(5),
                volume: row.get(6),
            })
            .collect())
    }
}

impl PriceDataPort for PostgresAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StocklensError> {
        self.select_bars(
            "SELECT symbol, date, open, high, low, close, volume
             FROM price_bars
             WHERE symbol = $1 AND date >= $2 AND date <= $3
             ORDER BY date ASC",
            &[&symbol, &start_date, &end_date],
        )
    }

    fn fetch_all_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, StocklensError> {
        self.select_bars(
            "SELECT symbol, date, open, high, low, close, volume
             FROM price_bars
             WHERE symbol = $1
             ORDER BY date ASC",
            &[&symbol],
        )
    }

    fn list_symbols(&self) -> Result<Vec<String>, StocklensError> {
        let mut conn = self.pool.get().map_err(pool_err)?;
        let rows = conn
            .query(
                "SELECT DISTINCT symbol FROM price_bars ORDER BY symbol",
                &[],
            )
            .map_err(pg_err)?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StocklensError> {
        let mut conn = self.pool.get().map_err(pool_err)?;
        let row = conn
            .query_one(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM price_bars WHERE symbol = $1",
                &[&symbol],
            )
            .map_err(pg_err)?;

        let min: Option<NaiveDate> = row.get(0);
        let max: Option<NaiveDate> = row.get(1);
        let count: i64 = row.get(2);

        match (min, max) {
            (Some(min), Some(max)) if count > 0 => Ok(Some((min, max, count as usize))),
            _ => Ok(None),
        }
    }
}

impl PredictionStorePort for PostgresAdapter {
    fn exists(
        &self,
        symbol: &str,
        date: NaiveDate,
        model_type: &str,
    ) -> Result<bool, StocklensError> {
        let mut conn = self.pool.get().map_err(pool_err)?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) FROM predictions
                 WHERE symbol = $1 AND date = $2 AND model_type = $3",
                &[&symbol, &date, &model_type],
            )
            .map_err(pg_err)?;

        let count: i64 = row.get(0);
        Ok(count > 0)
    }

    fn insert(&self, row: &ForecastRow) -> Result<(), StocklensError> {
        let mut conn = self.pool.get().map_err(pool_err)?;

        conn.execute(
            "INSERT INTO predictions
             (symbol, date, open, high, low, close, volume, model_type)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            &[
                &row.symbol,
                &row.date,
                &row.open,
                &row.high,
                &row.low,
                &row.close,
                &row.volume,
                &row.model_type,
            ],
        )
        .map_err(|e| {
            if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                StocklensError::DuplicateKey {
                    symbol: row.symbol.clone(),
                    date: row.date,
                    model_type: row.model_type.clone(),
                }
            } else {
                pg_err(e)
            }
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
        let mut conn = self.pool.get().map_err(pool_err)?;

        let rows = conn
            .query(
                "SELECT symbol, date, open, high, low, close, volume, model_type
                 FROM predictions
                 WHERE symbol = $1 AND model_type = $2
                   AND ($3::date IS NULL OR date >= $3)
                   AND ($4::date IS NULL OR date <= $4)
                 ORDER BY date ASC",
                &[&symbol, &model_type, &start_date, &end_date],
            )
            .map_err(pg_err)?;

        Ok(rows
            .into_iter()
            .map(|row| ForecastRow {
                symbol: row.get(0),
                date: row.get(1),
                open: row.get(2),
                high: row.get(3),
                low: row.get(4),
                close: row.get(5),
                volume: row.get(6),
                model_type: row.get(7),
            })
            .collect())
    }
}
