//! Vega-Lite chart specifications for datastore records.

use std::fmt;
use std::str::FromStr;

use datagov_il_ckan::models::Record;
use serde::Serialize;

use crate::error::{DataGovError, Result};

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";
pub const CHART_WIDTH: u32 = 600;
pub const CHART_HEIGHT: u32 = 400;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartType {
    Histogram,
    Bar,
    Line,
    Scatter,
}

impl ChartType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartType::Histogram => "histogram",
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Scatter => "scatter",
        }
    }

    /// Title used when the caller gives none, e.g. "Histogram Chart"
    pub fn default_title(self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => format!("{}{} Chart", first.to_uppercase(), chars.as_str()),
            None => "Chart".to_string(),
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = DataGovError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "histogram" => Ok(ChartType::Histogram),
            "bar" => Ok(ChartType::Bar),
            "line" => Ok(ChartType::Line),
            "scatter" => Ok(ChartType::Scatter),
            other => Err(DataGovError::UnsupportedChartType(other.to_string())),
        }
    }
}

/// Mark definition: a bare mark name or a mark object
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Mark {
    Name(&'static str),
    Detailed {
        #[serde(rename = "type")]
        mark_type: &'static str,
        point: bool,
    },
}

/// Encoding type of a channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    Quantitative,
    Nominal,
}

/// One encoding channel
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Channel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub measure: Option<Measure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<&'static str>,
    pub title: String,
}

impl Channel {
    fn field(field: &str, measure: Measure) -> Self {
        Self {
            field: Some(field.to_string()),
            measure: Some(measure),
            title: field.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Encoding {
    pub x: Channel,
    pub y: Channel,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InlineData {
    pub values: Vec<Record>,
}

/// A self-contained Vega-Lite document with inlined rows
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub title: String,
    pub data: InlineData,
    pub width: u32,
    pub height: u32,
    pub mark: Mark,
    pub encoding: Encoding,
}

/// A chart specification plus an HTML page that renders it
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartArtifact {
    pub vega_lite_spec: ChartSpec,
    pub html: String,
}

/// Build a chart specification.
///
/// `y_field` is ignored for histograms, which count rows per bin of
/// `x_field`. A blank `title` falls back to the chart type's default title.
pub fn build_chart(
    records: Vec<Record>,
    chart_type: ChartType,
    x_field: &str,
    y_field: Option<&str>,
    title: Option<&str>,
) -> ChartSpec {
    let y_field = y_field.unwrap_or("");

    let (mark, encoding) = match chart_type {
        ChartType::Histogram => (
            Mark::Name("bar"),
            Encoding {
                x: Channel {
                    bin: Some(true),
                    ..Channel::field(x_field, Measure::Quantitative)
                },
                y: Channel {
                    aggregate: Some("count"),
                    title: "Count".to_string(),
                    ..Channel::default()
                },
            },
        ),
        ChartType::Bar => (
            Mark::Name("bar"),
            Encoding {
                x: Channel::field(x_field, Measure::Nominal),
                y: Channel::field(y_field, Measure::Quantitative),
            },
        ),
        ChartType::Line => (
            Mark::Detailed {
                mark_type: "line",
                point: true,
            },
            Encoding {
                x: Channel::field(x_field, Measure::Nominal),
                y: Channel::field(y_field, Measure::Quantitative),
            },
        ),
        ChartType::Scatter => (
            Mark::Name("point"),
            Encoding {
                x: Channel::field(x_field, Measure::Quantitative),
                y: Channel::field(y_field, Measure::Quantitative),
            },
        ),
    };

    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| chart_type.default_title());

    ChartSpec {
        schema: VEGA_LITE_SCHEMA,
        title,
        data: InlineData { values: records },
        width: CHART_WIDTH,
        height: CHART_HEIGHT,
        mark,
        encoding,
    }
}

impl ChartArtifact {
    /// Pair a spec with its HTML rendering
    pub fn render(spec: ChartSpec) -> Result<Self> {
        let html = render_chart_html(&spec)?;
        Ok(Self {
            vega_lite_spec: spec,
            html,
        })
    }
}

/// Standalone HTML page rendering the spec with vega-embed
pub fn render_chart_html(spec: &ChartSpec) -> Result<String> {
    let spec_json = crate::html::script_json(spec)?;
    Ok(format!(
        r#"
<!DOCTYPE html>
<html>
<head>
  <script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>
</head>
<body>
  <div id="vis"></div>
  <script type="text/javascript">
    var spec = {spec_json};
    vegaEmbed('#vis', spec);
  </script>
</body>
</html>
"#
    ))
}
