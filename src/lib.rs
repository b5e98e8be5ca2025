//! chart-option-rs: declarative chart option compiler.
//!
//! Turns a chart type, tabular rows and a partly free-form configuration into
//! an ECharts-style option object, and back: option objects render as
//! editable source text, hand-edited text parses into objects through a
//! sandboxed evaluator, and stored configs keep a `$DATA` placeholder instead
//! of embedded rows.

pub mod api;
pub mod core;
pub mod error;
pub mod script;
pub mod telemetry;

pub use api::{
    ChartDocument, ChartOption, CompilerConfig, EditedConfig, OptionCompiler, generate_option,
    interpolate, is_templated, parse_config, prepare_for_storage, serialize_option,
};
pub use crate::core::{ChartConfig, ChartType, Row};
pub use error::{ChartError, ChartResult};
