//! Report bundle and chart windowing.
//!
//! A report shows the requested forecast rows as a table, then one chart per
//! tracked field comparing actuals against forecasts over a bounded window:
//! the 30 most recent actual rows, plus forecasts that overlap them or fall
//! within 30 days after the latest actual date.

use chrono::Duration;

use super::bar::PriceBar;
use super::forecast::ForecastRow;

/// Number of trailing actual rows shown on a chart page.
pub const ACTUAL_WINDOW: usize = 30;

/// How far past the latest actual date forecasts remain charted.
pub const FORWARD_WINDOW_DAYS: i64 = 30;

/// Everything a report request needs, assembled once per request.
/// `requested_rows` is limited to the caller's horizon; the other two hold
/// the full per-symbol history for the chart pages.
#[derive(Debug, Clone)]
pub struct ReportBundle {
    pub requested_rows: Vec<ForecastRow>,
    pub all_forecast_rows: Vec<ForecastRow>,
    pub all_actual_rows: Vec<PriceBar>,
}

/// Restrict a chart page's two series to the comparable window.
///
/// Returns the trailing [`ACTUAL_WINDOW`] actual rows (all of them when fewer
/// exist) and the forecast rows whose dates either coincide with that actual
/// window or fall within [`FORWARD_WINDOW_DAYS`] days after the latest
/// actual date. With no actual rows at all both series are empty.
pub fn chart_window<'a>(
    all_actual: &'a [PriceBar],
    all_forecast: &'a [ForecastRow],
) -> (&'a [PriceBar], Vec<&'a ForecastRow>) {
    let start = all_actual.len().saturating_sub(ACTUAL_WINDOW);
    let actual = &all_actual[start..];

    let Some(latest) = actual.iter().map(|b| b.date).max() else {
        return (actual, Vec::new());
    };
    let forward_end = latest + Duration::days(FORWARD_WINDOW_DAYS);

    let forecast = all_forecast
        .iter()
        .filter(|row| {
            actual.iter().any(|b| b.date == row.date)
                || (row.date > latest && row.date <= forward_end)
        })
        .collect();

    (actual, forecast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecast::LINEAR_REGRESSION;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn actual_rows(start: NaiveDate, count: usize) -> Vec<PriceBar> {
        (0..count)
            .map(|i| PriceBar {
                symbol: "TEST".into(),
                date: start + Duration::days(i as i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.5,
                volume: 1000,
            })
            .collect()
    }

    fn forecast_rows(start: NaiveDate, count: usize) -> Vec<ForecastRow> {
        (0..count)
            .map(|i| ForecastRow {
                symbol: "TEST".into(),
                date: start + Duration::days(i as i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.5,
                volume: 1000,
                model_type: LINEAR_REGRESSION.into(),
            })
            .collect()
    }

    #[test]
    fn actual_series_capped_at_thirty() {
        let actual = actual_rows(date(2024, 1, 1), 45);
        let (window, _) = chart_window(&actual, &[]);

        assert_eq!(window.len(), 30);
        // The trailing 30: first 15 rows dropped.
        assert_eq!(window[0].date, date(2024, 1, 16));
        assert_eq!(window[29].date, date(2024, 2, 14));
    }

    #[test]
    fn short_history_uses_all_actuals() {
        let actual = actual_rows(date(2024, 1, 1), 7);
        let (window, _) = chart_window(&actual, &[]);
        assert_eq!(window.len(), 7);
    }

    #[test]
    fn forecast_limited_to_forward_window() {
        let actual = actual_rows(date(2024, 1, 1), 10); // latest = Jan 10
        // Forecasts from Jan 11 for 60 days; only the first 30 survive.
        let forecast = forecast_rows(date(2024, 1, 11), 60);
        let (_, kept) = chart_window(&actual, &forecast);

        assert_eq!(kept.len(), 30);
        assert_eq!(kept[0].date, date(2024, 1, 11));
        assert_eq!(kept[29].date, date(2024, 2, 9));
    }

    #[test]
    fn forecast_overlapping_actual_window_is_kept() {
        let actual = actual_rows(date(2024, 1, 1), 10);
        // A stale forecast row inside the actual window still charts, so the
        // two series can be compared where they overlap.
        let forecast = forecast_rows(date(2024, 1, 5), 3); // Jan 5-7
        let (_, kept) = chart_window(&actual, &forecast);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn forecast_before_actual_window_is_dropped() {
        let actual = actual_rows(date(2024, 2, 1), 40); // window starts Feb 11
        let forecast = forecast_rows(date(2024, 2, 1), 5); // all before window
        let (window, kept) = chart_window(&actual, &forecast);

        assert_eq!(window[0].date, date(2024, 2, 11));
        assert!(kept.is_empty());
    }

    #[test]
    fn empty_forecast_leaves_actual_alone() {
        let actual = actual_rows(date(2024, 1, 1), 10);
        let (window, kept) = chart_window(&actual, &[]);
        assert_eq!(window.len(), 10);
        assert!(kept.is_empty());
    }

    #[test]
    fn no_actual_rows_yields_empty_series() {
        let forecast = forecast_rows(date(2024, 1, 1), 5);
        let (window, kept) = chart_window(&[], &forecast);
        assert!(window.is_empty());
        assert!(kept.is_empty());
    }
}
