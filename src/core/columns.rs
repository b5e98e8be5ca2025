use super::config::ChartConfig;
use super::types::Row;

/// Fallback palette used when a config names no colors.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#6366f1", "#22c55e", "#f59e0b", "#ef4444", "#06b6d4", "#8b5cf6", "#ec4899", "#14b8a6",
    "#f97316", "#64748b",
];

#[must_use]
pub fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|color| (*color).to_owned()).collect()
}

/// Column roles after applying config selectors and row-shape defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub x: String,
    pub y: Vec<String>,
}

impl ResolvedColumns {
    /// First y-column, used by single-value chart types.
    #[must_use]
    pub fn first_y(&self) -> Option<&str> {
        self.y.first().map(String::as_str)
    }
}

/// Resolves the x-column and y-columns for `rows`.
///
/// x: `xColumn` (or its legacy alias), else the first key of `rows[0]`.
/// y: `yColumns` (or its legacy alias), else every key of `rows[0]` except x,
/// in column order. Returns `None` for empty rows or a keyless first row.
#[must_use]
pub fn resolve_columns(rows: &[Row], config: &ChartConfig) -> Option<ResolvedColumns> {
    let first = rows.first()?;
    let x = match &config.x_column {
        Some(column) => column.clone(),
        None => first.keys().next()?.clone(),
    };
    let y = match &config.y_columns {
        Some(columns) => columns.clone(),
        None => first.keys().filter(|key| **key != x).cloned().collect(),
    };
    Some(ResolvedColumns { x, y })
}

/// `colors` (or `colorScheme`), else `fallback`.
#[must_use]
pub fn resolve_palette(config: &ChartConfig, fallback: &[String]) -> Vec<String> {
    config
        .colors
        .clone()
        .unwrap_or_else(|| fallback.to_vec())
}
