//! Ordinary least squares line fitting, one model per tracked field.

use super::bar::PriceBar;
use std::collections::HashMap;
use std::fmt;

/// The per-bar numeric fields a forecast is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Field {
    /// Fixed field order used by forecasts and report pages.
    pub const ALL: [Field; 5] = [
        Field::Open,
        Field::High,
        Field::Low,
        Field::Close,
        Field::Volume,
    ];

    pub fn value_of(&self, bar: &PriceBar) -> f64 {
        match self {
            Field::Open => bar.open,
            Field::High => bar.high,
            Field::Low => bar.low,
            Field::Close => bar.close,
            Field::Volume => bar.volume as f64,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Open => write!(f, "Open"),
            Field::High => write!(f, "High"),
            Field::Low => write!(f, "Low"),
            Field::Close => write!(f, "Close"),
            Field::Volume => write!(f, "Volume"),
        }
    }
}

/// A fitted line y = slope * x + intercept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearModel {
    /// Closed-form OLS fit. Returns `None` for fewer than two points or a
    /// degenerate x column (all values identical).
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<LinearModel> {
        if xs.len() < 2 || xs.len() != ys.len() {
            return None;
        }

        let n = xs.len() as f64;
        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = ys.iter().sum::<f64>() / n;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for (&x, &y) in xs.iter().zip(ys) {
            sxx += (x - mean_x) * (x - mean_x);
            sxy += (x - mean_x) * (y - mean_y);
        }

        if sxx == 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        Some(LinearModel {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// One independent model per field, fitted against the same x column.
/// Keyed by [`Field`] so adding a tracked field never touches call sites.
pub type FieldModels = HashMap<Field, LinearModel>;

/// Fit all five field models against `xs` (one x per bar, same order).
/// Returns `None` under the same conditions as [`LinearModel::fit`].
pub fn fit_field_models(xs: &[f64], bars: &[PriceBar]) -> Option<FieldModels> {
    let mut models = FieldModels::with_capacity(Field::ALL.len());
    for field in Field::ALL {
        let ys: Vec<f64> = bars.iter().map(|b| field.value_of(b)).collect();
        models.insert(field, LinearModel::fit(xs, &ys)?);
    }
    Some(models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bar(day: u32, open: f64, close: f64, volume: i64) -> PriceBar {
        PriceBar {
            symbol: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open,
            high: close + 1.0,
            low: open - 1.0,
            close,
            volume,
        }
    }

    #[test]
    fn two_point_fit_is_exact() {
        // close 100 at x=0, 110 at x=1 → slope 10, intercept 100; x=2 → 120.
        let model = LinearModel::fit(&[0.0, 1.0], &[100.0, 110.0]).unwrap();
        assert_relative_eq!(model.slope, 10.0);
        assert_relative_eq!(model.intercept, 100.0);
        assert_relative_eq!(model.predict(2.0), 120.0);
    }

    #[test]
    fn fit_minimizes_residuals_on_noisy_data() {
        // y = 2x + 1 with symmetric noise; OLS recovers the underlying line.
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.5, 2.5, 5.5, 6.5];
        let model = LinearModel::fit(&xs, &ys).unwrap();
        assert_relative_eq!(model.slope, 1.8, epsilon = 1e-9);
        assert_relative_eq!(model.intercept, 1.3, epsilon = 1e-9);
    }

    #[test]
    fn fit_rejects_single_point() {
        assert!(LinearModel::fit(&[1.0], &[2.0]).is_none());
    }

    #[test]
    fn fit_rejects_constant_x() {
        assert!(LinearModel::fit(&[3.0, 3.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn fit_rejects_length_mismatch() {
        assert!(LinearModel::fit(&[1.0, 2.0], &[1.0]).is_none());
    }

    #[test]
    fn field_models_are_independent() {
        let bars = vec![
            make_bar(1, 10.0, 100.0, 1000),
            make_bar(2, 20.0, 110.0, 900),
        ];
        let models = fit_field_models(&[0.0, 1.0], &bars).unwrap();

        assert_relative_eq!(models[&Field::Open].slope, 10.0);
        assert_relative_eq!(models[&Field::Close].slope, 10.0);
        assert_relative_eq!(models[&Field::Close].intercept, 100.0);
        // Volume trends down while prices trend up.
        assert_relative_eq!(models[&Field::Volume].slope, -100.0);
        assert_eq!(models.len(), 5);
    }

    #[test]
    fn field_order_is_fixed() {
        assert_eq!(
            Field::ALL
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec!["Open", "High", "Low", "Close", "Volume"]
        );
    }
}
