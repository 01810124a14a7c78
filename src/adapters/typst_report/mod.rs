//! Typst report generation.
//!
//! Resolves `{{PLACEHOLDER}}` markers in a Typst template (the built-in
//! default, or a custom file named by `template_path` in the `[report]`
//! section) and writes the final `.typ` file: a table of the requested
//! forecast rows followed by one actual-vs-forecast chart page per field.

pub mod chart_svg;
pub mod default_template;
pub mod tables;

use std::fs;

use crate::domain::regression::Field;
use crate::domain::report::{chart_window, ReportBundle};
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;
use chart_svg::SeriesPoint;

fn svg_to_typst(svg: &str) -> String {
    if svg.is_empty() {
        return "_No price data._".to_string();
    }
    format!(
        "#image.decode(\n\"{}\",\n  width: 100%,\n)",
        svg.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// Resolve all `{{PLACEHOLDER}}`s in the template and return final Typst
/// markup ready to be written to a `.typ` file.
pub fn resolve(template: &str, bundle: &ReportBundle) -> String {
    let mut output = template.to_string();

    let table = tables::render_forecast_table(&bundle.requested_rows);
    output = output.replace("{{FORECAST_TABLE}}", &table);

    let (actual_window, forecast_window) =
        chart_window(&bundle.all_actual_rows, &bundle.all_forecast_rows);

    for field in Field::ALL {
        let actual: Vec<SeriesPoint> = actual_window
            .iter()
            .map(|bar| SeriesPoint {
                date: bar.date,
                value: field.value_of(bar),
            })
            .collect();
        let forecast: Vec<SeriesPoint> = forecast_window
            .iter()
            .map(|row| SeriesPoint {
                date: row.date,
                value: row.field_value(field),
            })
            .collect();

        let svg = chart_svg::generate_field_chart_svg(&field.to_string(), &actual, &forecast);
        let marker = format!("{{{{{}_CHART}}}}", field.to_string().to_uppercase());
        output = output.replace(&marker, &svg_to_typst(&svg));
    }

    output
}

/// Writes reports as Typst markup files.
pub struct TypstReportAdapter {
    template_path: Option<String>,
}

impl TypstReportAdapter {
    pub fn new() -> Self {
        Self {
            template_path: None,
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Self {
        Self {
            template_path: config.get_string("report", "template_path"),
        }
    }

    fn load_template(&self) -> Result<String, std::io::Error> {
        match &self.template_path {
            Some(path) => fs::read_to_string(path),
            None => Ok(default_template::template().to_string()),
        }
    }
}

impl Default for TypstReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for TypstReportAdapter {
    fn write(
        &self,
        bundle: &ReportBundle,
        output_path: &str,
    ) -> Result<(), crate::domain::error::StocklensError> {
        let template = self.load_template()?;
        let markup = resolve(&template, bundle);
        fs::write(output_path, markup)?;
        Ok(())
    }
}
