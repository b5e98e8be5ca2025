use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Chart type tag as stored alongside a chart config.
///
/// Unknown tags are carried verbatim in [`ChartType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartType {
    Bar,
    Line,
    Area,
    Scatter,
    Pie,
    Doughnut,
    Rose,
    Radar,
    Funnel,
    Treemap,
    Gauge,
    Heatmap,
    Table,
    Kpi,
    Other(String),
}

impl ChartType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Area => "area",
            Self::Scatter => "scatter",
            Self::Pie => "pie",
            Self::Doughnut => "doughnut",
            Self::Rose => "rose",
            Self::Radar => "radar",
            Self::Funnel => "funnel",
            Self::Treemap => "treemap",
            Self::Gauge => "gauge",
            Self::Heatmap => "heatmap",
            Self::Table => "table",
            Self::Kpi => "kpi",
            Self::Other(tag) => tag,
        }
    }

    /// Types drawn on an x/y category grid.
    #[must_use]
    pub fn is_cartesian(&self) -> bool {
        matches!(self, Self::Bar | Self::Line | Self::Area | Self::Scatter)
    }

    /// Types rendered outside the option generator.
    #[must_use]
    pub fn is_rendered_externally(&self) -> bool {
        matches!(self, Self::Table | Self::Kpi)
    }
}

impl FromStr for ChartType {
    type Err = Infallible;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let parsed = match tag.trim().to_ascii_lowercase().as_str() {
            "bar" => Self::Bar,
            "line" => Self::Line,
            "area" => Self::Area,
            "scatter" => Self::Scatter,
            "pie" => Self::Pie,
            "doughnut" => Self::Doughnut,
            "rose" => Self::Rose,
            "radar" => Self::Radar,
            "funnel" => Self::Funnel,
            "treemap" => Self::Treemap,
            "gauge" => Self::Gauge,
            "heatmap" => Self::Heatmap,
            "table" => Self::Table,
            "kpi" => Self::Kpi,
            _ => Self::Other(tag.to_owned()),
        };
        Ok(parsed)
    }
}

impl From<&str> for ChartType {
    fn from(tag: &str) -> Self {
        match tag.parse() {
            Ok(parsed) => parsed,
            Err(never) => match never {},
        }
    }
}

impl From<String> for ChartType {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<ChartType> for String {
    fn from(chart_type: ChartType) -> Self {
        match chart_type {
            ChartType::Other(tag) => tag,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
