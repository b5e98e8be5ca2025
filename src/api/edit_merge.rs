use serde_json::Value;
use tracing::debug;

use crate::core::config::string_list;
use crate::core::{ChartConfig, DisplayBlock};

use super::ChartOption;

/// Outcome of applying hand-edited option text.
#[derive(Debug, Clone, PartialEq)]
pub enum EditedConfig {
    /// The text is a complete option (it has `series`) and is used as-is.
    Spec(ChartOption),
    /// Recognized display fields were merged back into the chart config.
    Config(ChartConfig),
}

/// Folds a parsed option back into `config`.
///
/// `title`, `legend`, `grid`, `tooltip`, `xAxis` and `yAxis` objects replace
/// the corresponding blocks and `color` replaces `colors`. Everything else in
/// the option is ignored.
#[must_use]
pub fn merge_edited_option(option: ChartOption, config: &ChartConfig) -> EditedConfig {
    if option.contains_key("series") {
        debug!("edited text carries series, using it as a complete option");
        return EditedConfig::Spec(option);
    }

    let mut merged = config.clone();
    let mut applied = 0usize;
    for (key, value) in option {
        let slot = match key.as_str() {
            "title" => &mut merged.title,
            "legend" => &mut merged.legend,
            "grid" => &mut merged.grid,
            "tooltip" => &mut merged.tooltip,
            "xAxis" => &mut merged.x_axis,
            "yAxis" => &mut merged.y_axis,
            "color" => {
                if let Some(colors) = string_list(Some(value)) {
                    merged.colors = Some(colors);
                    applied += 1;
                }
                continue;
            }
            _ => continue,
        };
        if let Value::Object(fields) = value {
            *slot = Some(DisplayBlock::from_object(fields));
            applied += 1;
        }
    }
    debug!(fields = applied, "merged edited text into chart config");
    EditedConfig::Config(merged)
}
