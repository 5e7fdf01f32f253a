//! Visualization context for terminal analyses.
//!
//! Renders plot data into a self-contained HTML document by substituting
//! `${name}` placeholders in a template. Analyses receive a [`VizContext`]
//! handle and return whatever artifact they like; using it is optional.

use serde_json::{json, Value};
use std::borrow::Cow;

const TEMPLATE: &str = include_str!("plot.html");

/// A single series for [`VizContext::line_plot`].
#[derive(Debug, Clone)]
pub struct LineSeries {
    /// Series label shown in the legend.
    pub title: String,
    /// The (x, y) points in display order.
    pub points: Vec<(f64, f64)>,
}

/// Handle through which analyses render visual output.
#[derive(Debug, Clone)]
pub struct VizContext {
    template: Cow<'static, str>,
}

impl VizContext {
    /// Creates a context using the built-in HTML template.
    #[must_use]
    pub fn new() -> Self {
        Self {
            template: Cow::Borrowed(TEMPLATE),
        }
    }

    /// Replaces the HTML template.
    ///
    /// The template may reference `${title}`, `${data}` and `${layout}`.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Cow::Owned(template.into());
        self
    }

    /// Renders arbitrary plot traces into an HTML document.
    ///
    /// `data` and `layout` follow the Plotly trace/layout shape and are
    /// substituted into the template as JSON.
    #[must_use]
    pub fn plot(&self, data: &Value, layout: &Value, title: &str) -> String {
        substitute_placeholders(
            &self.template,
            &[
                ("data", &data.to_string()),
                ("layout", &layout.to_string()),
                ("title", title),
            ],
        )
    }

    /// Renders a line plot from typed series.
    #[must_use]
    pub fn line_plot(&self, title: &str, series: &[LineSeries]) -> String {
        let data: Vec<Value> = series
            .iter()
            .map(|s| {
                let xs: Vec<f64> = s.points.iter().map(|(x, _)| *x).collect();
                let ys: Vec<f64> = s.points.iter().map(|(_, y)| *y).collect();
                json!({
                    "x": xs,
                    "y": ys,
                    "name": s.title,
                    "mode": "lines",
                    "type": "scatter",
                })
            })
            .collect();
        let layout = json!({ "title": title });
        self.plot(&Value::Array(data), &layout, title)
    }
}

impl Default for VizContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Substitutes the first occurrence of each `${name}` placeholder.
fn substitute_placeholders(source: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = source.to_string();
    for (name, value) in vars {
        rendered = rendered.replacen(&format!("${{{name}}}"), value, 1);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_placeholders() {
        let out = substitute_placeholders("<h1>${title}</h1>", &[("title", "Hello")]);
        assert_eq!(out, "<h1>Hello</h1>");
    }

    #[test]
    fn test_substitute_replaces_first_occurrence_only() {
        let out = substitute_placeholders("${x} ${x}", &[("x", "1")]);
        assert_eq!(out, "1 ${x}");
    }

    #[test]
    fn test_plot_embeds_serialized_data() {
        let viz = VizContext::new();
        let html = viz.plot(
            &json!([{"x": [1, 2], "y": [3, 4]}]),
            &json!({"title": "Issues"}),
            "Issues",
        );

        assert!(html.contains(r#"[{"x":[1,2],"y":[3,4]}]"#));
        assert!(html.contains("Issues"));
        assert!(!html.contains("${data}"));
    }

    #[test]
    fn test_line_plot_builds_traces() {
        let viz = VizContext::new();
        let html = viz.line_plot(
            "Commits over time",
            &[LineSeries {
                title: "commits".to_string(),
                points: vec![(1.0, 2.0), (2.0, 5.0)],
            }],
        );

        assert!(html.contains(r#""mode":"lines""#));
        assert!(html.contains("Commits over time"));
    }

    #[test]
    fn test_custom_template() {
        let viz = VizContext::new().with_template("title=${title}");
        let html = viz.plot(&json!([]), &json!({}), "T");
        assert_eq!(html, "title=T");
    }
}
