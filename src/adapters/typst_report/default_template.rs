//! Built-in Typst report template.
//!
//! One page of requested forecast rows, then one chart page per tracked
//! field. `{{PLACEHOLDER}}` markers are substituted by `resolve`.

pub fn template() -> &'static str {
    r#"#set page(paper: "a4", margin: 2cm)
#set text(font: "New Computer Modern", size: 10pt)

= Stock Forecast Report

== Requested Forecasts

{{FORECAST_TABLE}}

#pagebreak()

== Open

{{OPEN_CHART}}

#pagebreak()

== High

{{HIGH_CHART}}

#pagebreak()

== Low

{{LOW_CHART}}

#pagebreak()

== Close

{{CLOSE_CHART}}

#pagebreak()

== Volume

{{VOLUME_CHART}}
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_contains_every_placeholder() {
        let t = template();
        for marker in [
            "{{FORECAST_TABLE}}",
            "{{OPEN_CHART}}",
            "{{HIGH_CHART}}",
            "{{LOW_CHART}}",
            "{{CLOSE_CHART}}",
            "{{VOLUME_CHART}}",
        ] {
            assert!(t.contains(marker), "missing {marker}");
        }
    }

    #[test]
    fn field_pages_follow_the_table() {
        let t = template();
        let table_at = t.find("{{FORECAST_TABLE}}").unwrap();
        let open_at = t.find("{{OPEN_CHART}}").unwrap();
        let volume_at = t.find("{{VOLUME_CHART}}").unwrap();
        assert!(table_at < open_at);
        assert!(open_at < volume_at);
    }
}
