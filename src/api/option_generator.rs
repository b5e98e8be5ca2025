use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::core::{
    ChartConfig, ChartType, DisplayBlock, ResolvedColumns, Row, numeric_value, resolve_columns,
    resolve_palette, rows_to_value,
};

use super::{ChartOption, CompilerConfig};

/// How cartesian series reference row data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesBinding {
    /// Rows go into `dataset.source`; series pick columns through `encode`.
    #[default]
    Dataset,
    /// Legacy layout: `xAxis.data` plus a `data` array per series.
    RawArrays,
}

const RADAR_HEADROOM: f64 = 1.2;
const AREA_FILL_OPACITY: f64 = 0.3;

/// Builds renderer options from a chart type, rows and a declarative config.
///
/// Generation is total and deterministic: empty rows yield an empty option and
/// unrecognized chart types render through the bar branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionGenerator {
    font_family: String,
    palette: Vec<String>,
    binding: SeriesBinding,
}

impl Default for OptionGenerator {
    fn default() -> Self {
        Self::from_config(&CompilerConfig::default())
    }
}

impl OptionGenerator {
    #[must_use]
    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            font_family: config.font_family.clone(),
            palette: config.default_palette.clone(),
            binding: config.binding,
        }
    }

    #[must_use]
    pub fn binding(&self) -> SeriesBinding {
        self.binding
    }

    #[must_use]
    pub fn generate(
        &self,
        chart_type: &ChartType,
        rows: &[Row],
        config: &ChartConfig,
    ) -> ChartOption {
        let Some(columns) = resolve_columns(rows, config) else {
            debug!(%chart_type, rows = rows.len(), "no rows or columns to chart");
            return ChartOption::new();
        };
        debug!(
            %chart_type,
            x = %columns.x,
            y = ?columns.y,
            rows = rows.len(),
            "resolved chart columns"
        );

        let mut option = self.base_option(chart_type, config);
        let series = match chart_type {
            ChartType::Pie | ChartType::Doughnut | ChartType::Rose => {
                pie_series(chart_type, rows, &columns, config)
            }
            ChartType::Radar => radar_series(&mut option, rows, &columns, config),
            ChartType::Funnel => funnel_series(rows, &columns, config),
            ChartType::Treemap => treemap_series(rows, &columns, config),
            ChartType::Gauge => gauge_series(rows, &columns, config),
            ChartType::Heatmap => heatmap_series(&mut option, rows, &columns, config),
            ChartType::Bar | ChartType::Line | ChartType::Area | ChartType::Scatter => {
                self.cartesian_series(&mut option, chart_type, rows, &columns, config)
            }
            other => {
                debug!(
                    chart_type = %other,
                    rendered_externally = other.is_rendered_externally(),
                    "no dedicated branch, rendering as bar"
                );
                self.cartesian_series(&mut option, &ChartType::Bar, rows, &columns, config)
            }
        };
        debug!(%chart_type, series = series.len(), "generated series");
        option.insert("series".to_owned(), Value::Array(series));
        option
    }

    fn base_option(&self, chart_type: &ChartType, config: &ChartConfig) -> ChartOption {
        let mut option = ChartOption::new();
        option.insert("backgroundColor".to_owned(), json!("transparent"));
        option.insert(
            "textStyle".to_owned(),
            json!({ "fontFamily": self.font_family }),
        );
        option.insert(
            "color".to_owned(),
            json!(resolve_palette(config, &self.palette)),
        );

        if !config.title.as_ref().is_some_and(DisplayBlock::is_hidden) {
            let defaults = json!({
                "left": "center",
                "textStyle": { "fontSize": 14, "fontWeight": 600, "color": "#111827" },
            });
            option.insert("title".to_owned(), merge_block(defaults, config.title.as_ref()));
        }

        let trigger = if uses_axis_tooltip(chart_type) { "axis" } else { "item" };
        let tooltip = json!({
            "trigger": trigger,
            "backgroundColor": "rgba(17, 24, 39, 0.92)",
            "borderWidth": 0,
            "textStyle": { "color": "#f9fafb" },
        });
        option.insert("tooltip".to_owned(), merge_block(tooltip, config.tooltip.as_ref()));

        if !config.legend.as_ref().is_some_and(DisplayBlock::is_hidden) {
            let defaults = json!({ "type": "scroll", "bottom": 0 });
            option.insert("legend".to_owned(), merge_block(defaults, config.legend.as_ref()));
        }

        let grid = json!({
            "left": 24,
            "right": 24,
            "top": 48,
            "bottom": 48,
            "containLabel": true,
        });
        option.insert("grid".to_owned(), merge_block(grid, config.grid.as_ref()));
        option
    }

    fn cartesian_series(
        &self,
        option: &mut ChartOption,
        chart_type: &ChartType,
        rows: &[Row],
        columns: &ResolvedColumns,
        config: &ChartConfig,
    ) -> Vec<Value> {
        let mut x_axis = json!({ "type": "category" });
        match self.binding {
            SeriesBinding::Dataset => {
                let mut dimensions = Vec::with_capacity(columns.y.len() + 1);
                dimensions.push(columns.x.clone());
                dimensions.extend(columns.y.iter().cloned());
                option.insert(
                    "dataset".to_owned(),
                    json!({ "dimensions": dimensions, "source": rows_to_value(rows) }),
                );
            }
            SeriesBinding::RawArrays => {
                x_axis["data"] = Value::Array(column_values(rows, &columns.x));
            }
        }
        option.insert("xAxis".to_owned(), merge_block(x_axis, config.x_axis.as_ref()));
        option.insert(
            "yAxis".to_owned(),
            merge_block(json!({ "type": "value" }), config.y_axis.as_ref()),
        );

        let series_type = match chart_type {
            ChartType::Line | ChartType::Area => "line",
            ChartType::Scatter => "scatter",
            _ => "bar",
        };
        columns
            .y
            .iter()
            .map(|column| {
                let mut series = Map::new();
                series.insert("name".to_owned(), json!(column));
                series.insert("type".to_owned(), json!(series_type));
                match self.binding {
                    SeriesBinding::Dataset => {
                        series.insert(
                            "encode".to_owned(),
                            json!({ "x": columns.x, "y": column }),
                        );
                    }
                    SeriesBinding::RawArrays => {
                        series.insert("data".to_owned(), Value::Array(column_values(rows, column)));
                    }
                }
                if matches!(chart_type, ChartType::Line | ChartType::Area) {
                    series.insert("smooth".to_owned(), json!(true));
                }
                if *chart_type == ChartType::Area {
                    series.insert("areaStyle".to_owned(), json!({ "opacity": AREA_FILL_OPACITY }));
                }
                with_series_params(series, column, config)
            })
            .collect()
    }
}

fn uses_axis_tooltip(chart_type: &ChartType) -> bool {
    !matches!(
        chart_type,
        ChartType::Pie
            | ChartType::Doughnut
            | ChartType::Rose
            | ChartType::Radar
            | ChartType::Funnel
            | ChartType::Treemap
            | ChartType::Gauge
            | ChartType::Heatmap
    )
}

/// Shallow merge: block fields replace same-named defaults.
fn merge_block(defaults: Value, block: Option<&DisplayBlock>) -> Value {
    let mut merged = match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Some(block) = block {
        for (key, value) in block.to_map() {
            merged.insert(key, value);
        }
    }
    Value::Object(merged)
}

fn with_series_params(mut series: Map<String, Value>, name: &str, config: &ChartConfig) -> Value {
    if let Some(params) = config.series_params.get(name) {
        for (key, value) in params {
            series.insert(key.clone(), value.clone());
        }
    }
    Value::Object(series)
}

fn cell(row: &Row, column: &str) -> Value {
    row.get(column).cloned().unwrap_or(Value::Null)
}

fn column_values(rows: &[Row], column: &str) -> Vec<Value> {
    rows.iter().map(|row| cell(row, column)).collect()
}

fn label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn name_value_pairs(rows: &[Row], x: &str, y: &str) -> Vec<Value> {
    rows.iter()
        .map(|row| json!({ "name": cell(row, x), "value": cell(row, y) }))
        .collect()
}

fn pie_series(
    chart_type: &ChartType,
    rows: &[Row],
    columns: &ResolvedColumns,
    config: &ChartConfig,
) -> Vec<Value> {
    let Some(value_column) = columns.first_y() else {
        return Vec::new();
    };
    let mut series = Map::new();
    series.insert("name".to_owned(), json!(value_column));
    series.insert("type".to_owned(), json!("pie"));
    let radius = match chart_type {
        ChartType::Doughnut => json!(["40%", "70%"]),
        ChartType::Rose => json!(["20%", "70%"]),
        _ => json!("65%"),
    };
    series.insert("radius".to_owned(), radius);
    if *chart_type == ChartType::Rose {
        series.insert("roseType".to_owned(), json!("area"));
    }
    series.insert(
        "data".to_owned(),
        Value::Array(name_value_pairs(rows, &columns.x, value_column)),
    );
    vec![with_series_params(series, value_column, config)]
}

/// Rows become indicators; each y-column becomes one series over all rows.
fn radar_series(
    option: &mut ChartOption,
    rows: &[Row],
    columns: &ResolvedColumns,
    config: &ChartConfig,
) -> Vec<Value> {
    let indicator: Vec<Value> = rows
        .iter()
        .map(|row| {
            let row_max = columns
                .y
                .iter()
                .filter_map(|column| row.get(column).and_then(numeric_value))
                .reduce(f64::max)
                .unwrap_or(0.0);
            json!({ "name": label(&cell(row, &columns.x)), "max": row_max * RADAR_HEADROOM })
        })
        .collect();
    option.insert("radar".to_owned(), json!({ "indicator": indicator }));

    columns
        .y
        .iter()
        .map(|column| {
            let mut series = Map::new();
            series.insert("name".to_owned(), json!(column));
            series.insert("type".to_owned(), json!("radar"));
            series.insert(
                "data".to_owned(),
                json!([{ "name": column, "value": column_values(rows, column) }]),
            );
            with_series_params(series, column, config)
        })
        .collect()
}

fn funnel_series(rows: &[Row], columns: &ResolvedColumns, config: &ChartConfig) -> Vec<Value> {
    let Some(value_column) = columns.first_y() else {
        return Vec::new();
    };
    let mut series = Map::new();
    series.insert("name".to_owned(), json!(value_column));
    series.insert("type".to_owned(), json!("funnel"));
    series.insert("sort".to_owned(), json!("descending"));
    series.insert("gap".to_owned(), json!(2));
    series.insert(
        "label".to_owned(),
        json!({ "show": true, "position": "inside" }),
    );
    series.insert(
        "data".to_owned(),
        Value::Array(name_value_pairs(rows, &columns.x, value_column)),
    );
    vec![with_series_params(series, value_column, config)]
}

fn treemap_series(rows: &[Row], columns: &ResolvedColumns, config: &ChartConfig) -> Vec<Value> {
    let Some(value_column) = columns.first_y() else {
        return Vec::new();
    };
    let mut series = Map::new();
    series.insert("name".to_owned(), json!(value_column));
    series.insert("type".to_owned(), json!("treemap"));
    series.insert(
        "data".to_owned(),
        Value::Array(name_value_pairs(rows, &columns.x, value_column)),
    );
    vec![with_series_params(series, value_column, config)]
}

/// Single value from row 0 only.
fn gauge_series(rows: &[Row], columns: &ResolvedColumns, config: &ChartConfig) -> Vec<Value> {
    let Some(value_column) = config
        .value_column
        .as_deref()
        .or_else(|| columns.first_y())
    else {
        return Vec::new();
    };
    let value = rows
        .first()
        .map_or(Value::Null, |row| cell(row, value_column));

    let mut series = Map::new();
    series.insert("name".to_owned(), json!(value_column));
    series.insert("type".to_owned(), json!("gauge"));
    if let Some(target) = config.target {
        series.insert("max".to_owned(), json!(target));
    }
    if config.prefix.is_some() || config.suffix.is_some() {
        let formatter = format!(
            "{}{{value}}{}",
            config.prefix.as_deref().unwrap_or_default(),
            config.suffix.as_deref().unwrap_or_default()
        );
        series.insert("detail".to_owned(), json!({ "formatter": formatter }));
    }
    series.insert(
        "data".to_owned(),
        json!([{ "name": value_column, "value": value }]),
    );
    vec![with_series_params(series, value_column, config)]
}

/// One `[xIndex, yIndex, value]` triple per row and y-column.
fn heatmap_series(
    option: &mut ChartOption,
    rows: &[Row],
    columns: &ResolvedColumns,
    config: &ChartConfig,
) -> Vec<Value> {
    let mut data = Vec::with_capacity(rows.len() * columns.y.len());
    let mut range: Option<(f64, f64)> = None;
    for (x_index, row) in rows.iter().enumerate() {
        for (y_index, column) in columns.y.iter().enumerate() {
            let value = cell(row, column);
            if let Some(number) = numeric_value(&value) {
                range = Some(match range {
                    Some((min, max)) => (min.min(number), max.max(number)),
                    None => (number, number),
                });
            }
            data.push(json!([x_index, y_index, value]));
        }
    }
    let (min, max) = range.unwrap_or((0.0, 0.0));

    let x_axis = json!({
        "type": "category",
        "data": column_values(rows, &columns.x),
        "splitArea": { "show": true },
    });
    let y_axis = json!({
        "type": "category",
        "data": columns.y,
        "splitArea": { "show": true },
    });
    option.insert("xAxis".to_owned(), merge_block(x_axis, config.x_axis.as_ref()));
    option.insert("yAxis".to_owned(), merge_block(y_axis, config.y_axis.as_ref()));
    option.insert(
        "visualMap".to_owned(),
        json!({
            "min": min,
            "max": max,
            "calculable": true,
            "orient": "horizontal",
            "left": "center",
            "bottom": 0,
        }),
    );

    let mut series = Map::new();
    series.insert("name".to_owned(), json!(columns.x));
    series.insert("type".to_owned(), json!("heatmap"));
    series.insert("label".to_owned(), json!({ "show": true }));
    series.insert("data".to_owned(), Value::Array(data));
    vec![with_series_params(series, &columns.x, config)]
}
