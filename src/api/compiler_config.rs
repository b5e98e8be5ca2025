use serde::{Deserialize, Serialize};

use crate::core::default_palette;
use crate::error::{ChartError, ChartResult};
use crate::script::SandboxLimits;

use super::data_templater::DATA_PLACEHOLDER;
use super::option_generator::SeriesBinding;

pub const DEFAULT_FONT_FAMILY: &str = "Inter, system-ui, sans-serif";

/// Compiler setup shared by parsing, templating and option generation.
///
/// Serializable so host applications can persist it next to their own
/// settings instead of inventing an ad-hoc format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_palette")]
    pub default_palette: Vec<String>,
    #[serde(default)]
    pub binding: SeriesBinding,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    #[serde(default)]
    pub limits: SandboxLimits,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            font_family: default_font_family(),
            default_palette: default_palette(),
            binding: SeriesBinding::default(),
            placeholder: default_placeholder(),
            limits: SandboxLimits::default(),
        }
    }

    /// Sets the font family written into every generated option.
    #[must_use]
    pub fn with_font_family(mut self, font_family: impl Into<String>) -> Self {
        self.font_family = font_family.into();
        self
    }

    /// Sets the palette used when a chart config names no colors.
    #[must_use]
    pub fn with_default_palette<I, S>(mut self, palette: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_palette = palette.into_iter().map(Into::into).collect();
        self
    }

    /// Sets how generated series bind to row data.
    #[must_use]
    pub fn with_binding(mut self, binding: SeriesBinding) -> Self {
        self.binding = binding;
        self
    }

    /// Sets the token standing in for dataset rows in stored configs.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Sets sandbox evaluation bounds.
    #[must_use]
    pub fn with_limits(mut self, limits: SandboxLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn to_json_pretty(&self) -> ChartResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ChartError::Serialization(format!("failed to serialize compiler config: {e}"))
        })
    }

    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| ChartError::InvalidConfig(format!("failed to parse compiler config: {e}")))
    }
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_owned()
}

fn default_placeholder() -> String {
    DATA_PLACEHOLDER.to_owned()
}
