//! Chart rendering
//!
//! A [`ChartRenderer`] turns a condition and the dataset into a [`Chart`]: a
//! Plotly figure (`data` + `layout`) that can be embedded in a standalone
//! HTML page.
//!
//! - [`Condition::Violin`]: one violin trace per measurement, grouped by
//!   species, with the inner box and mean line visible.
//! - [`Condition::Pair`]: a scatter matrix (`splom`) over both
//!   measurements, one trace per species.

use crate::dataset::{Dataset, DatasetRow, Species};
use crate::experiment::Condition;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;

/// Title of the violin chart.
pub const VIOLIN_TITLE: &str = "Violin Plot: Bill Length and Depth by Species";
/// Title of the pair chart.
pub const PAIR_TITLE: &str = "Pair Plot: Bill Length vs. Bill Depth by Species";

const BILL_LENGTH_LABEL: &str = "Bill Length (mm)";
const BILL_DEPTH_LABEL: &str = "Bill Depth (mm)";

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Renders a condition's visualization of the dataset.
pub trait ChartRenderer: Send + Sync {
    /// Build the chart for `condition`.
    ///
    /// # Errors
    /// Returns [`Error::DataUnavailable`] if there is nothing to plot.
    fn render(&self, condition: Condition, dataset: &Dataset) -> Result<Chart>;
}

/// A rendered chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    condition: Condition,
    title: String,
    figure: Value,
}

impl Chart {
    /// Condition this chart visualizes.
    #[must_use]
    pub const fn condition(&self) -> Condition {
        self.condition
    }

    /// Chart title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Plotly figure (`{"data": [...], "layout": {...}}`).
    #[must_use]
    pub const fn figure(&self) -> &Value {
        &self.figure
    }

    /// Figure as a JSON string.
    ///
    /// # Errors
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.figure)?)
    }

    /// Standalone HTML page embedding the figure.
    ///
    /// # Errors
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_html(&self) -> Result<String> {
        // "</" inside a <script> block would close it early.
        let figure = self.to_json()?.replace("</", "<\\/");
        Ok(HTML_TEMPLATE
            .replace("__PLOTLY_CDN__", PLOTLY_CDN)
            .replace("__TITLE__", &escape_html(&self.title))
            .replace("__FIGURE__", &figure))
    }

    /// Write [`Chart::to_html`] to `path`.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be written.
    pub async fn write_html(&self, path: impl AsRef<Path>) -> Result<()> {
        let html = self.to_html()?;
        tokio::fs::write(path.as_ref(), html).await?;
        Ok(())
    }
}

/// Plotly figure builder for both conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlotlyRenderer;

impl PlotlyRenderer {
    /// Create a renderer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn violin(dataset: &Dataset) -> Value {
        let species: Vec<&str> = dataset.rows().iter().map(|r| r.species.as_str()).collect();
        let measurements: [(&str, fn(&DatasetRow) -> f64); 2] = [
            (BILL_LENGTH_LABEL, |r| r.bill_length_mm),
            (BILL_DEPTH_LABEL, |r| r.bill_depth_mm),
        ];

        let data: Vec<Value> = measurements
            .iter()
            .map(|(label, value)| {
                let y: Vec<f64> = dataset.rows().iter().map(value).collect();
                json!({
                    "type": "violin",
                    "name": label,
                    "x": species,
                    "y": y,
                    "box": { "visible": true },
                    "meanline": { "visible": true },
                })
            })
            .collect();

        json!({
            "data": data,
            "layout": {
                "title": { "text": VIOLIN_TITLE },
                "violinmode": "group",
                "xaxis": { "title": { "text": "Species" } },
                "yaxis": { "title": { "text": "Measurement (mm)" } },
            },
        })
    }

    fn pair(dataset: &Dataset) -> Value {
        let data: Vec<Value> = dataset
            .species_present()
            .into_iter()
            .map(|species| {
                let (length, depth): (Vec<f64>, Vec<f64>) = dataset
                    .of_species(species)
                    .map(|r| (r.bill_length_mm, r.bill_depth_mm))
                    .unzip();
                json!({
                    "type": "splom",
                    "name": species.as_str(),
                    "dimensions": [
                        { "label": BILL_LENGTH_LABEL, "values": length },
                        { "label": BILL_DEPTH_LABEL, "values": depth },
                    ],
                    "marker": { "color": species_color(species), "size": 6 },
                    "diagonal": { "visible": false },
                })
            })
            .collect();

        json!({
            "data": data,
            "layout": {
                "title": { "text": PAIR_TITLE },
                "showlegend": true,
            },
        })
    }
}

impl ChartRenderer for PlotlyRenderer {
    fn render(&self, condition: Condition, dataset: &Dataset) -> Result<Chart> {
        if dataset.is_empty() {
            return Err(Error::DataUnavailable(
                "dataset has no valid rows to plot".to_string(),
            ));
        }

        let (title, figure) = match condition {
            Condition::Violin => (VIOLIN_TITLE, Self::violin(dataset)),
            Condition::Pair => (PAIR_TITLE, Self::pair(dataset)),
        };
        Ok(Chart {
            condition,
            title: title.to_string(),
            figure,
        })
    }
}

const fn species_color(species: Species) -> &'static str {
    match species {
        Species::Adelie => "#1f77b4",
        Species::Chinstrap => "#ff7f0e",
        Species::Gentoo => "#2ca02c",
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const HTML_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>__TITLE__</title>
  <script src="__PLOTLY_CDN__"></script>
  <style>
    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; margin: 2rem; }
    #chart { width: 100%; max-width: 960px; height: 640px; }
  </style>
</head>
<body>
  <div id="chart"></div>
  <script>
    const figure = __FIGURE__;
    Plotly.newPlot("chart", figure.data, figure.layout, { responsive: true });
  </script>
</body>
</html>
"##;
