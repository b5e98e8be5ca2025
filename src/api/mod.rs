mod collaborators;
mod compiler;
mod compiler_config;
mod config_parser;
mod data_templater;
mod document;
mod edit_merge;
mod json_contract;
mod object_formatter;
mod option_generator;
mod validation;

use serde_json::{Map, Value};

use crate::core::{ChartConfig, ChartType, Row};
use crate::error::ChartResult;

pub use collaborators::{ChartStore, MemoryChartStore, RowSource, StaticRowSource};
pub use compiler::OptionCompiler;
pub use compiler_config::{CompilerConfig, DEFAULT_FONT_FAMILY};
pub use config_parser::{ConfigParser, ParseStrategy};
pub use data_templater::{DATA_PLACEHOLDER, DataTemplater};
pub use document::ChartDocument;
pub use edit_merge::{EditedConfig, merge_edited_option};
pub use json_contract::{CHART_DOCUMENT_JSON_SCHEMA_V1, ChartDocumentJsonContractV1};
pub use object_formatter::{format_literal, serialize_option};
pub use option_generator::{OptionGenerator, SeriesBinding};

/// Renderer option object (title/tooltip/legend/grid/axes/series/dataset).
pub type ChartOption = Map<String, Value>;

fn default_compiler() -> ChartResult<OptionCompiler> {
    OptionCompiler::new(CompilerConfig::default())
}

/// Parses config text with the default setup.
pub fn parse_config(text: &str) -> ChartResult<ChartOption> {
    default_compiler()?.parse(text)
}

/// Generates an option with the default setup.
#[must_use]
pub fn generate_option(
    chart_type: &ChartType,
    rows: &[Row],
    config: &ChartConfig,
) -> ChartOption {
    OptionGenerator::default().generate(chart_type, rows, config)
}

/// Resolves templated text against `rows` with the default setup; `{}` on failure.
#[must_use]
pub fn interpolate(text: &str, rows: &[Row]) -> ChartOption {
    default_compiler().map_or_else(
        |_| ChartOption::new(),
        |compiler| compiler.interpolate(text, rows),
    )
}

/// Replaces an embedded dataset source with the default placeholder.
#[must_use]
pub fn prepare_for_storage(config: &Value) -> Value {
    default_compiler().map_or_else(
        |_| config.clone(),
        |compiler| compiler.prepare_for_storage(config),
    )
}

/// Whether `config` mentions the default placeholder.
#[must_use]
pub fn is_templated(config: &Value) -> bool {
    match config {
        Value::String(text) => text.contains(DATA_PLACEHOLDER),
        other => other.to_string().contains(DATA_PLACEHOLDER),
    }
}

/// Resolves rows from `source` and renders `document` with the default setup.
pub fn preview(
    source: &dyn RowSource,
    dataset_id: &str,
    document: &ChartDocument,
) -> ChartResult<ChartOption> {
    default_compiler()?.preview(source, dataset_id, document)
}
