use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{ChartConfig, ChartType, Row};
use crate::error::ChartResult;

use super::collaborators::RowSource;
use super::data_templater::DATA_PLACEHOLDER;
use super::{ChartOption, OptionCompiler, serialize_option};

/// A chart as persisted: type, declarative config and optional hand-edited
/// option text that overrides generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDocument {
    pub chart_type: ChartType,
    #[serde(default)]
    pub config: ChartConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_option: Option<String>,
}

impl ChartDocument {
    #[must_use]
    pub fn new(chart_type: ChartType, config: ChartConfig) -> Self {
        Self {
            chart_type,
            config,
            custom_option: None,
        }
    }

    #[must_use]
    pub fn with_custom_option(mut self, text: impl Into<String>) -> Self {
        self.custom_option = Some(text.into());
        self
    }

    /// Whether the custom option text refers to the dataset placeholder.
    #[must_use]
    pub fn is_templated(&self) -> bool {
        self.custom_option
            .as_deref()
            .is_some_and(|text| text.contains(DATA_PLACEHOLDER))
    }

    /// Stored form under the default compiler setup.
    #[must_use]
    pub fn for_storage(&self) -> Self {
        match OptionCompiler::new(Default::default()) {
            Ok(compiler) => compiler.document_for_storage(self),
            Err(err) => {
                warn!(error = %err, "default compiler unavailable, storing document as-is");
                self.clone()
            }
        }
    }

    /// Renders under the default compiler setup; never fails.
    #[must_use]
    pub fn render(&self, rows: &[Row]) -> ChartOption {
        match OptionCompiler::new(Default::default()) {
            Ok(compiler) => compiler.render_document(self, rows),
            Err(err) => {
                warn!(error = %err, "default compiler unavailable, rendering an empty option");
                ChartOption::new()
            }
        }
    }
}

impl OptionCompiler {
    /// Replaces rows embedded in the custom option text with the placeholder.
    ///
    /// Text that is already templated, does not parse, or embeds no rows is
    /// kept verbatim so hand formatting and function values survive.
    #[must_use]
    pub fn document_for_storage(&self, document: &ChartDocument) -> ChartDocument {
        let Some(text) = document.custom_option.as_deref() else {
            return document.clone();
        };
        if text.contains(self.placeholder()) {
            return document.clone();
        }
        let parsed = match self.parse(text) {
            Ok(option) => Value::Object(option),
            Err(err) => {
                debug!(error = %err, "custom option does not parse, storing verbatim");
                return document.clone();
            }
        };
        let prepared = self.prepare_for_storage(&parsed);
        match prepared {
            Value::Object(option) if prepared_changed(&parsed, &option) => {
                let mut stored = document.clone();
                stored.custom_option = Some(serialize_option(&option));
                stored
            }
            _ => document.clone(),
        }
    }

    /// Custom option text wins over generation; failures degrade to `{}`.
    #[must_use]
    pub fn render_document(&self, document: &ChartDocument, rows: &[Row]) -> ChartOption {
        match document.custom_option.as_deref() {
            Some(text) => self.interpolate(text, rows),
            None => self.generate(&document.chart_type, rows, &document.config),
        }
    }

    /// Fetches rows for `dataset_id` and renders `document` against them.
    pub fn preview(
        &self,
        source: &dyn RowSource,
        dataset_id: &str,
        document: &ChartDocument,
    ) -> ChartResult<ChartOption> {
        let rows = source.fetch_rows(dataset_id)?;
        debug!(dataset_id, rows = rows.len(), "fetched preview rows");
        Ok(self.render_document(document, &rows))
    }
}

fn prepared_changed(parsed: &Value, prepared: &ChartOption) -> bool {
    parsed.as_object().is_none_or(|original| original != prepared)
}
