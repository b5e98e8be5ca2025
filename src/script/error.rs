use thiserror::Error;

use super::lexer::Span;

pub type ScriptResult<T> = Result<T, ScriptError>;

/// Failure raised while lexing, parsing or evaluating sandboxed config text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("lex error at {span}: {message}")]
    Lex { span: Span, message: String },

    #[error("parse error at {span}: {message}")]
    Parse { span: Span, message: String },

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("`{0}` is not defined in the sandbox")]
    UnknownBinding(String),

    #[error("evaluation exceeded the step budget of {0}")]
    StepLimit(usize),

    #[error("evaluation exceeded the nesting budget of {0}")]
    DepthLimit(usize),

    #[error("evaluation built a value larger than {0} bytes")]
    SizeLimit(usize),

    #[error("evaluated text did not produce an object")]
    NotAnObject,
}

impl ScriptError {
    pub(crate) fn lex(span: Span, message: impl Into<String>) -> Self {
        Self::Lex {
            span,
            message: message.into(),
        }
    }

    pub(crate) fn parse(span: Span, message: impl Into<String>) -> Self {
        Self::Parse {
            span,
            message: message.into(),
        }
    }

    pub(crate) fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }
}
