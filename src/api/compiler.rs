use serde_json::Value;

use crate::core::{ChartConfig, ChartType, KpiSummary, Row, summarize_kpi};
use crate::error::ChartResult;

use super::config_parser::{ConfigParser, ParseStrategy};
use super::data_templater::DataTemplater;
use super::edit_merge::{EditedConfig, merge_edited_option};
use super::option_generator::OptionGenerator;
use super::validation::validate_compiler_config;
use super::{ChartOption, CompilerConfig, serialize_option};

/// Main facade consumed by host applications.
///
/// `OptionCompiler` ties config-text parsing, option generation, formatting
/// and dataset templating to one validated [`CompilerConfig`].
#[derive(Debug, Clone)]
pub struct OptionCompiler {
    config: CompilerConfig,
    parser: ConfigParser,
    templater: DataTemplater,
    generator: OptionGenerator,
}

impl OptionCompiler {
    pub fn new(config: CompilerConfig) -> ChartResult<Self> {
        let config = validate_compiler_config(config)?;
        Ok(Self {
            parser: ConfigParser::new(&config.placeholder, config.limits)?,
            templater: DataTemplater::new(&config.placeholder, config.limits)?,
            generator: OptionGenerator::from_config(&config),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    #[must_use]
    pub fn placeholder(&self) -> &str {
        self.templater.placeholder()
    }

    /// Parses free-form config text into an option object.
    pub fn parse(&self, text: &str) -> ChartResult<ChartOption> {
        self.parser.parse(text)
    }

    pub fn parse_with_strategy(&self, text: &str) -> ChartResult<(ChartOption, ParseStrategy)> {
        self.parser.parse_with_strategy(text)
    }

    #[must_use]
    pub fn serialize(&self, option: &ChartOption) -> String {
        serialize_option(option)
    }

    #[must_use]
    pub fn generate(
        &self,
        chart_type: &ChartType,
        rows: &[Row],
        config: &ChartConfig,
    ) -> ChartOption {
        self.generator.generate(chart_type, rows, config)
    }

    #[must_use]
    pub fn interpolate(&self, text: &str, rows: &[Row]) -> ChartOption {
        self.templater.interpolate(text, rows)
    }

    #[must_use]
    pub fn prepare_for_storage(&self, config: &Value) -> Value {
        self.templater.prepare_for_storage(config)
    }

    #[must_use]
    pub fn is_templated(&self, config: &Value) -> bool {
        self.templater.is_templated(config)
    }

    /// Parses hand-edited text and folds it into `config`, or returns it as a
    /// complete option when it defines `series`.
    pub fn apply_edited_text(&self, text: &str, config: &ChartConfig) -> ChartResult<EditedConfig> {
        let option = self.parse(text)?;
        Ok(merge_edited_option(option, config))
    }

    #[must_use]
    pub fn summarize_kpi(&self, rows: &[Row], config: &ChartConfig) -> Option<KpiSummary> {
        summarize_kpi(rows, config)
    }
}
