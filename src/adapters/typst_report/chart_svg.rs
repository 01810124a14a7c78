//! SVG chart rendering for report pages.
//!
//! Each field page charts two labelled series over calendar dates: actual
//! values in solid blue, forecast values in dashed green. X positions are
//! derived from day offsets so the forecast continues smoothly past the last
//! actual point.

use chrono::NaiveDate;

const CHART_WIDTH: f64 = 600.0;
const CHART_HEIGHT: f64 = 300.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;

/// One (date, value) sample of a charted series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

fn path_data(
    points: &[SeriesPoint],
    x_of: impl Fn(NaiveDate) -> f64,
    y_of: impl Fn(f64) -> f64,
) -> String {
    let mut path = String::new();
    for (i, point) in points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        path.push_str(&format!(
            "{}{} {:.1} {:.1}",
            if i == 0 { "" } else { " " },
            cmd,
            x_of(point.date),
            y_of(point.value)
        ));
    }
    path
}

/// Render one field's actual-vs-forecast chart. Empty string when there is
/// nothing at all to draw; a single series renders alone.
pub fn generate_field_chart_svg(
    field_label: &str,
    actual: &[SeriesPoint],
    forecast: &[SeriesPoint],
) -> String {
    let all_points = || actual.iter().chain(forecast);

    if actual.is_empty() && forecast.is_empty() {
        return String::new();
    }

    let min_date = all_points().map(|p| p.date).min().unwrap_or_default();
    let max_date = all_points().map(|p| p.date).max().unwrap_or_default();
    let min_value = all_points().map(|p| p.value).fold(f64::INFINITY, f64::min);
    let max_value = all_points()
        .map(|p| p.value)
        .fold(f64::NEG_INFINITY, f64::max);

    let day_span = ((max_date - min_date).num_days() as f64).max(1.0);
    let value_range = (max_value - min_value).max(1.0);

    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let x_of = |date: NaiveDate| -> f64 {
        MARGIN_LEFT + ((date - min_date).num_days() as f64 / day_span) * plot_width
    };
    let y_of =
        |v: f64| -> f64 { MARGIN_TOP + plot_height - ((v - min_value) / value_range) * plot_height };

    let mut svg = String::new();
    svg.push_str(&format!(
        r##"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"##,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

    // Axes
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM,
        CHART_WIDTH - MARGIN_RIGHT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));

    // Y labels: max, mid, min
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{:.2}</text>\n",
        MARGIN_LEFT - 5.0,
        MARGIN_TOP + 5.0,
        max_value
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{:.2}</text>\n",
        MARGIN_LEFT - 5.0,
        MARGIN_TOP + plot_height / 2.0,
        (max_value + min_value) / 2.0
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{:.2}</text>\n",
        MARGIN_LEFT - 5.0,
        CHART_HEIGHT - MARGIN_BOTTOM - 5.0,
        min_value
    ));

    // X labels: first and last date
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
        MARGIN_LEFT,
        CHART_HEIGHT - 5.0,
        min_date
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
        CHART_WIDTH - MARGIN_RIGHT,
        CHART_HEIGHT - 5.0,
        max_date
    ));

    if !actual.is_empty() {
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"#2563eb\" stroke-width=\"2\"/>\n",
            path_data(actual, x_of, y_of)
        ));
    }
    if !forecast.is_empty() {
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"#16a34a\" stroke-width=\"2\" stroke-dasharray=\"5,3\"/>\n",
            path_data(forecast, x_of, y_of)
        ));
    }

    // Legend
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"15\" font-size=\"11\" fill=\"#2563eb\">Actual {}</text>\n",
        MARGIN_LEFT, field_label
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"15\" font-size=\"11\" fill=\"#16a34a\">Predicted {}</text>\n",
        MARGIN_LEFT + 150.0,
        field_label
    ));

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: u32, value: f64) -> SeriesPoint {
        SeriesPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            value,
        }
    }

    #[test]
    fn empty_series_render_nothing() {
        assert!(generate_field_chart_svg("Close", &[], &[]).is_empty());
    }

    #[test]
    fn actual_only_chart_has_one_path() {
        let actual = vec![point(1, 100.0), point(2, 101.0), point(3, 102.0)];
        let svg = generate_field_chart_svg("Close", &actual, &[]);

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<path").count(), 1);
        assert!(svg.contains("Actual Close"));
    }

    #[test]
    fn dual_series_chart_has_two_paths() {
        let actual = vec![point(1, 100.0), point(2, 101.0)];
        let forecast = vec![point(3, 102.0), point(4, 103.0)];
        let svg = generate_field_chart_svg("Volume", &actual, &forecast);

        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains("Actual Volume"));
        assert!(svg.contains("Predicted Volume"));
    }

    #[test]
    fn x_axis_spans_both_series() {
        let actual = vec![point(1, 100.0)];
        let forecast = vec![point(20, 110.0)];
        let svg = generate_field_chart_svg("Open", &actual, &forecast);

        assert!(svg.contains("2024-01-01"));
        assert!(svg.contains("2024-01-20"));
    }

    #[test]
    fn flat_series_does_not_divide_by_zero() {
        let actual = vec![point(1, 100.0), point(2, 100.0)];
        let svg = generate_field_chart_svg("Low", &actual, &[]);
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
    }
}
