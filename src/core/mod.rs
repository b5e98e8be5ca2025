pub mod chart_type;
pub mod columns;
pub mod config;
pub mod kpi;
pub mod types;

pub use chart_type::ChartType;
pub use columns::{
    DEFAULT_PALETTE, ResolvedColumns, default_palette, resolve_columns, resolve_palette,
};
pub use config::{ChartConfig, DisplayBlock};
pub use kpi::{KpiSummary, Trend, summarize_kpi};
pub use types::{Row, numeric_value, rows_from_value, rows_to_value};
