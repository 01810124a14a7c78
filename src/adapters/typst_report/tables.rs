//! Table formatting for forecast reports.

use crate::domain::forecast::ForecastRow;

/// Typst table of the requested forecast rows — every stored column except
/// internal identifiers.
pub fn render_forecast_table(rows: &[ForecastRow]) -> String {
    if rows.is_empty() {
        return "_No forecast rows requested._".to_string();
    }

    let mut out = String::from(
        "#table(\n  columns: 8,\n  align: (left, left, right, right, right, right, right, left),\n",
    );
    out.push_str(
        "  [*Symbol*], [*Date*], [*Open*], [*High*], [*Low*], [*Close*], [*Volume*], [*Model*],\n",
    );

    for row in rows {
        out.push_str(&format!(
            "  [{}], [{}], [{:.2}], [{:.2}], [{:.2}], [{:.2}], [{}], [{}],\n",
            row.symbol, row.date, row.open, row.high, row.low, row.close, row.volume, row.model_type
        ));
    }

    out.push(')');
    out
}
