use thiserror::Error;

use crate::script::ScriptError;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("no valid configuration object found: {0}")]
    ConfigParse(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("row source failed: {0}")]
    RowSource(String),

    #[error("chart store failed: {0}")]
    Store(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}
