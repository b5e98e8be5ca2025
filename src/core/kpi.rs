use serde::{Deserialize, Serialize};

use super::columns::resolve_columns;
use super::config::ChartConfig;
use super::types::{Row, numeric_value};

/// Direction of the current value against the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Scalar summary behind a KPI card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub value: f64,
    pub display: String,
    pub previous: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub trend: Option<Trend>,
    pub target: Option<f64>,
    pub target_progress: Option<f64>,
}

/// Computes the KPI scalars from row 0 (and row 1 for the previous value).
///
/// The value column is `valueColumn`, else the first y-column. The previous
/// value comes from `previousValueColumn` on row 0, else the value column on
/// row 1. Returns `None` when the current value is missing or not numeric.
#[must_use]
pub fn summarize_kpi(rows: &[Row], config: &ChartConfig) -> Option<KpiSummary> {
    let first = rows.first()?;
    let value_column = match &config.value_column {
        Some(column) => column.clone(),
        None => resolve_columns(rows, config)?.y.into_iter().next()?,
    };
    let value = first.get(&value_column).and_then(numeric_value)?;

    let previous = match &config.previous_value_column {
        Some(column) => first.get(column).and_then(numeric_value),
        None => rows
            .get(1)
            .and_then(|row| row.get(&value_column))
            .and_then(numeric_value),
    };
    let change = previous.map(|previous| value - previous);
    let change_percent = previous
        .filter(|previous| *previous != 0.0)
        .map(|previous| (value - previous) / previous.abs() * 100.0);
    let trend = change.filter(|_| config.trend_enabled()).map(|change| {
        if change > 0.0 {
            Trend::Up
        } else if change < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    });
    let target_progress = config
        .target
        .filter(|target| *target != 0.0)
        .map(|target| value / target * 100.0);

    Some(KpiSummary {
        value,
        display: format!(
            "{}{}{}",
            config.prefix.as_deref().unwrap_or_default(),
            format_kpi_number(value),
            config.suffix.as_deref().unwrap_or_default()
        ),
        previous,
        change,
        change_percent,
        trend,
        target: config.target,
        target_progress,
    })
}

/// Integers print bare; fractions keep at most two decimals.
fn format_kpi_number(value: f64) -> String {
    if value.fract() == 0.0 {
        return format!("{value:.0}");
    }
    let fixed = format!("{value:.2}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_owned()
}

#[cfg(test)]
mod tests {
    use super::format_kpi_number;

    #[test]
    fn display_numbers_drop_trailing_zeros() {
        assert_eq!(format_kpi_number(42.0), "42");
        assert_eq!(format_kpi_number(3.10), "3.1");
        assert_eq!(format_kpi_number(2.456), "2.46");
    }
}
