use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{Row, rows_to_value};
use crate::error::{ChartError, ChartResult};
use crate::script::{Sandbox, SandboxLimits, ScriptValue, into_object, strip_type_annotations};

use super::ChartOption;

/// Token standing in for a dataset's rows in stored configs.
pub const DATA_PLACEHOLDER: &str = "$DATA";

/// Embeds rows into templated configs for preview and strips them back out
/// before storage.
#[derive(Debug, Clone)]
pub struct DataTemplater {
    placeholder: String,
    limits: SandboxLimits,
    expression_use: Regex,
    option_prefix: Regex,
}

impl DataTemplater {
    pub fn new(placeholder: &str, limits: SandboxLimits) -> ChartResult<Self> {
        let token = regex::escape(placeholder);
        let expression_use = Regex::new(&format!(r"{token}\s*\.|{token}\s*\[|\.\.\.\s*{token}"))
            .map_err(|e| ChartError::InvalidConfig(format!("invalid placeholder pattern: {e}")))?;
        let option_prefix = Regex::new(r"^\s*(?:(?:var|let|const)\s+)?option\s*=\s*")
            .map_err(|e| ChartError::InvalidConfig(format!("invalid option prefix pattern: {e}")))?;
        Ok(Self {
            placeholder: placeholder.to_owned(),
            limits,
            expression_use,
            option_prefix,
        })
    }

    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Whether the config (text or object) mentions the placeholder anywhere.
    #[must_use]
    pub fn is_templated(&self, config: &Value) -> bool {
        match config {
            Value::String(text) => text.contains(&self.placeholder),
            other => other.to_string().contains(&self.placeholder),
        }
    }

    /// Whether `text` uses the placeholder as an expression operand
    /// (`$DATA.x`, `$DATA[i]` or `...$DATA`) rather than as a plain value.
    #[must_use]
    pub fn uses_placeholder_as_expression(&self, text: &str) -> bool {
        self.expression_use.is_match(text)
    }

    /// Resolves templated config text against `rows`.
    ///
    /// Never fails: text that cannot be resolved yields an empty option.
    #[must_use]
    pub fn interpolate(&self, text: &str, rows: &[Row]) -> ChartOption {
        let data = rows_to_value(rows);

        if self.uses_placeholder_as_expression(text) {
            match self.evaluate(text, &data) {
                Ok(option) => return option,
                Err(err) => {
                    debug!(
                        error = %err,
                        "expression template failed, falling back to substitution"
                    );
                }
            }
        }

        let substituted = self.substitute(text, &data);
        if let Ok(Value::Object(option)) = serde_json::from_str::<Value>(&substituted) {
            return option;
        }
        debug!("substituted template is not plain JSON, evaluating as code");

        let body = self.option_prefix.replace(&substituted, "");
        match self.evaluate(&body, &data) {
            Ok(option) => option,
            Err(err) => {
                warn!(error = %err, "template could not be resolved, rendering an empty option");
                ChartOption::new()
            }
        }
    }

    /// Replaces a non-empty embedded dataset source with the placeholder.
    ///
    /// Text configs and configs that are already templated pass through.
    #[must_use]
    pub fn prepare_for_storage(&self, config: &Value) -> Value {
        if matches!(config, Value::String(_)) || self.is_templated(config) {
            return config.clone();
        }
        let mut prepared = config.clone();
        let Some(dataset) = prepared.get_mut("dataset") else {
            return prepared;
        };
        if let Some(datasets) = dataset.as_array_mut() {
            for dataset in datasets {
                self.template_source(dataset);
            }
        } else {
            self.template_source(dataset);
        }
        prepared
    }

    fn template_source(&self, dataset: &mut Value) {
        let Some(source) = dataset.get_mut("source") else {
            return;
        };
        if source.as_array().is_some_and(|rows| !rows.is_empty()) {
            *source = Value::String(self.placeholder.clone());
        }
    }

    fn substitute(&self, text: &str, data: &Value) -> String {
        let serialized = data.to_string();
        let single = format!("'{}'", self.placeholder);
        let double = format!("\"{}\"", self.placeholder);
        text.replace(&single, &serialized)
            .replace(&double, &serialized)
            .replace(&self.placeholder, &serialized)
    }

    fn evaluate(&self, text: &str, data: &Value) -> ChartResult<ChartOption> {
        let sandbox = Sandbox::new(
            self.placeholder.clone(),
            ScriptValue::from_json(data),
            self.limits,
        );
        let clean = strip_type_annotations(text);
        let value = sandbox.run_template_body(&clean)?;
        Ok(into_object(value)?)
    }
}
