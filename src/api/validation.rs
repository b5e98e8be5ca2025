use crate::error::{ChartError, ChartResult};
use crate::script::{SandboxLimits, is_identifier_name};

use super::CompilerConfig;

pub(super) fn validate_compiler_config(config: CompilerConfig) -> ChartResult<CompilerConfig> {
    if config.font_family.trim().is_empty() {
        return Err(ChartError::InvalidConfig("font family must not be empty".to_owned()));
    }

    if config.default_palette.is_empty() {
        return Err(ChartError::InvalidConfig(
            "default palette must contain at least one color".to_owned(),
        ));
    }
    if let Some(index) = config
        .default_palette
        .iter()
        .position(|color| color.trim().is_empty())
    {
        return Err(ChartError::InvalidConfig(format!(
            "default palette entry {index} must not be empty"
        )));
    }

    validate_placeholder(&config.placeholder)?;
    validate_sandbox_limits(config.limits)?;
    Ok(config)
}

fn validate_placeholder(placeholder: &str) -> ChartResult<()> {
    if !is_identifier_name(placeholder) || !placeholder.is_ascii() {
        return Err(ChartError::InvalidConfig(format!(
            "placeholder `{placeholder}` must be an ASCII identifier (letters, digits, `_`, `$`, not starting with a digit)"
        )));
    }
    Ok(())
}

fn validate_sandbox_limits(limits: SandboxLimits) -> ChartResult<SandboxLimits> {
    let bounds = [
        ("max_steps", limits.max_steps),
        ("max_depth", limits.max_depth),
        ("max_value_bytes", limits.max_value_bytes),
    ];
    for (name, value) in bounds {
        if value == 0 {
            return Err(ChartError::InvalidConfig(format!("sandbox {name} must be > 0")));
        }
    }
    Ok(limits)
}
