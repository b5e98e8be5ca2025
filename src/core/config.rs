use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ChartError, ChartResult};

use super::types::numeric_value;

/// A display block (`title`, `legend`, `grid`, `tooltip`, axes): a visibility
/// flag plus renderer-specific fields passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DisplayBlock {
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            show: Some(false),
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.show == Some(false)
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// The block as renderer fields, `show` included when set.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        if let Some(show) = self.show {
            map.insert("show".to_owned(), Value::Bool(show));
        }
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone());
        }
        map
    }

    /// Splits a boolean `show` out of a plain object; any other `show` value
    /// stays a pass-through field.
    #[must_use]
    pub fn from_object(mut fields: Map<String, Value>) -> Self {
        let show = match fields.remove("show") {
            Some(Value::Bool(show)) => Some(show),
            Some(other) => {
                fields.insert("show".to_owned(), other);
                None
            }
            None => None,
        };
        Self { show, fields }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::from_object(fields)),
            _ => None,
        }
    }
}

/// Declarative chart configuration as edited through the chart controls.
///
/// Every field is optional. Legacy aliases (`labelColumn`, `dataColumns`,
/// `colorScheme`) are folded into their canonical field on ingestion and
/// never serialized back. Unknown fields survive in [`ChartConfig::extra`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ChartConfigWire", rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub series_params: IndexMap<String, Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<DisplayBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<DisplayBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<DisplayBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<DisplayBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<DisplayBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<DisplayBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_value_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_trend: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChartConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a config from a loosely-typed JSON value.
    pub fn from_value(value: Value) -> ChartResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| ChartError::InvalidConfig(format!("failed to read chart config: {e}")))
    }

    /// Canonical JSON form (legacy aliases already folded).
    pub fn to_value(&self) -> ChartResult<Value> {
        serde_json::to_value(self)
            .map_err(|e| ChartError::Serialization(format!("failed to write chart config: {e}")))
    }

    #[must_use]
    pub fn with_x_column(mut self, column: impl Into<String>) -> Self {
        self.x_column = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_y_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.y_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colors = Some(colors.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_series_params(
        mut self,
        series: impl Into<String>,
        params: Map<String, Value>,
    ) -> Self {
        self.series_params.insert(series.into(), params);
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: DisplayBlock) -> Self {
        self.title = Some(title);
        self
    }

    #[must_use]
    pub fn with_legend(mut self, legend: DisplayBlock) -> Self {
        self.legend = Some(legend);
        self
    }

    #[must_use]
    pub fn with_value_column(mut self, column: impl Into<String>) -> Self {
        self.value_column = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: f64) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn with_affixes(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self.suffix = Some(suffix.into());
        self
    }

    /// `showTrend` defaults to on.
    #[must_use]
    pub fn trend_enabled(&self) -> bool {
        self.show_trend.unwrap_or(true)
    }
}

/// Ingestion shape: accepts legacy aliases and loosely-typed values.
///
/// Known fields whose value has an unusable type are dropped.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartConfigWire {
    x_column: Option<Value>,
    label_column: Option<Value>,
    y_columns: Option<Value>,
    data_columns: Option<Value>,
    series_params: Option<Value>,
    title: Option<Value>,
    legend: Option<Value>,
    grid: Option<Value>,
    tooltip: Option<Value>,
    x_axis: Option<Value>,
    y_axis: Option<Value>,
    colors: Option<Value>,
    color_scheme: Option<Value>,
    value_column: Option<Value>,
    target: Option<Value>,
    prefix: Option<Value>,
    suffix: Option<Value>,
    previous_value_column: Option<Value>,
    show_trend: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<ChartConfigWire> for ChartConfig {
    fn from(wire: ChartConfigWire) -> Self {
        let series_params = match wire.series_params {
            Some(Value::Object(params)) => params
                .into_iter()
                .filter_map(|(series, value)| match value {
                    Value::Object(fields) => Some((series, fields)),
                    _ => None,
                })
                .collect(),
            _ => IndexMap::new(),
        };

        Self {
            x_column: non_empty_string(wire.x_column)
                .or_else(|| non_empty_string(wire.label_column)),
            y_columns: string_list(wire.y_columns).or_else(|| string_list(wire.data_columns)),
            series_params,
            title: wire.title.and_then(DisplayBlock::from_value),
            legend: wire.legend.and_then(DisplayBlock::from_value),
            grid: wire.grid.and_then(DisplayBlock::from_value),
            tooltip: wire.tooltip.and_then(DisplayBlock::from_value),
            x_axis: wire.x_axis.and_then(DisplayBlock::from_value),
            y_axis: wire.y_axis.and_then(DisplayBlock::from_value),
            colors: string_list(wire.colors).or_else(|| string_list(wire.color_scheme)),
            value_column: non_empty_string(wire.value_column),
            target: wire.target.as_ref().and_then(numeric_value),
            prefix: plain_string(wire.prefix),
            suffix: plain_string(wire.suffix),
            previous_value_column: non_empty_string(wire.previous_value_column),
            show_trend: match wire.show_trend {
                Some(Value::Bool(show)) => Some(show),
                _ => None,
            },
            extra: wire.extra,
        }
    }
}

fn plain_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty_string(value: Option<Value>) -> Option<String> {
    plain_string(value).filter(|s| !s.is_empty())
}

/// An empty list counts as absent so the next alias or the default applies.
pub(crate) fn string_list(value: Option<Value>) -> Option<Vec<String>> {
    let list: Vec<String> = match value? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        _ => return None,
    };
    (!list.is_empty()).then_some(list)
}
