//! Linear-regression forecast engine.
//!
//! Fits one independent OLS line per tracked field against the ordinal date
//! and projects forward day by day. Persistence of the projected rows is the
//! caller's concern (see the prediction store port); everything here is pure.

use chrono::{Datelike, Duration, NaiveDate};

use super::bar::PriceBar;
use super::error::StocklensError;
use super::regression::{fit_field_models, Field};

/// Model identifier stored with every forecast row.
pub const LINEAR_REGRESSION: &str = "Linear Regression";

/// A projected bar for a future date, keyed by (symbol, date, model_type).
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRow {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub model_type: String,
}

impl ForecastRow {
    /// The projected value for one tracked field.
    pub fn field_value(&self, field: Field) -> f64 {
        match field {
            Field::Open => self.open,
            Field::High => self.high,
            Field::Low => self.low,
            Field::Close => self.close,
            Field::Volume => self.volume as f64,
        }
    }
}

/// Calendar date as a day count (days since the common era). The regression's
/// sole independent variable.
pub fn date_ordinal(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Volume predictions come out of the fit real-valued and possibly negative.
/// Stored volumes are integers ≥ 0: round half away from zero, then clamp.
pub fn coerce_volume(raw: f64) -> i64 {
    raw.round().max(0.0) as i64
}

/// The dates a horizon of `n` days covers: last_date+1 ..= last_date+n.
pub fn horizon_dates(last_date: NaiveDate, horizon_days: usize) -> Vec<NaiveDate> {
    (1..=horizon_days as i64)
        .map(|i| last_date + Duration::days(i))
        .collect()
}

/// Fit per-field models over the full history and project `horizon_days`
/// rows past the most recent bar.
///
/// `bars` must be ascending by date. Fails with `InsufficientHistory` when a
/// line cannot be fit (fewer than two bars) and `InvalidParameter` for a zero
/// horizon. Exactly `horizon_days` rows are returned, ascending, gap-free.
pub fn project(
    symbol: &str,
    bars: &[PriceBar],
    horizon_days: usize,
) -> Result<Vec<ForecastRow>, StocklensError> {
    if horizon_days == 0 {
        return Err(StocklensError::invalid_parameter(
            "horizon_days",
            "must be at least 1",
        ));
    }
    if bars.len() < 2 {
        return Err(StocklensError::InsufficientHistory {
            symbol: symbol.into(),
            bars: bars.len(),
            minimum: 2,
        });
    }

    let ordinals: Vec<f64> = bars.iter().map(|b| date_ordinal(b.date)).collect();
    let models =
        fit_field_models(&ordinals, bars).ok_or_else(|| StocklensError::InsufficientHistory {
            symbol: symbol.into(),
            bars: bars.len(),
            minimum: 2,
        })?;

    let last_date = bars[bars.len() - 1].date;

    let rows = horizon_dates(last_date, horizon_days)
        .into_iter()
        .map(|date| {
            let at = |field: Field| models[&field].predict(date_ordinal(date));
            ForecastRow {
                symbol: symbol.to_string(),
                date,
                open: at(Field::Open),
                high: at(Field::High),
                low: at(Field::Low),
                close: at(Field::Close),
                volume: coerce_volume(at(Field::Volume)),
                model_type: LINEAR_REGRESSION.to_string(),
            }
        })
        .collect();

    Ok(rows)
}
