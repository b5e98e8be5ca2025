//! Sandboxed evaluation of config source text.
//!
//! Config text is copy-pasted JavaScript/TypeScript. Instead of executing it,
//! the sandbox interprets a small, side-effect-free subset of the language.
//! Evaluated text can see exactly two injected names: the charting namespace
//! (`echarts`) and the data placeholder binding. Anything else it references
//! must be declared by the text itself.

mod annotations;
mod ast;
mod builtins;
mod error;
mod interpreter;
mod lexer;
mod parser;
mod value;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

pub use annotations::strip_type_annotations;
pub use error::{ScriptError, ScriptResult};
pub use lexer::{Lexer, NumberLiteral, Punct, Span, Token, TokenKind, is_identifier_name};
pub use value::{NativeFunction, ScriptValue, format_number};

use interpreter::Interpreter;
use parser::Parser;

/// Name under which the charting namespace is visible to evaluated text.
pub const CHARTING_NAMESPACE: &str = "echarts";

/// Resource bounds for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxLimits {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Approximate size cap for any string, array or object the text builds.
    #[serde(default = "default_max_value_bytes")]
    pub max_value_bytes: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_depth: default_max_depth(),
            max_value_bytes: default_max_value_bytes(),
        }
    }
}

fn default_max_steps() -> usize {
    100_000
}

fn default_max_depth() -> usize {
    128
}

fn default_max_value_bytes() -> usize {
    64 * 1024 * 1024
}

/// The charting namespace object: `echarts.graphic.{LinearGradient,RadialGradient}`.
#[must_use]
pub fn charting_namespace() -> ScriptValue {
    let mut graphic = IndexMap::new();
    graphic.insert(
        "LinearGradient".to_owned(),
        ScriptValue::Native(NativeFunction::LinearGradient),
    );
    graphic.insert(
        "RadialGradient".to_owned(),
        ScriptValue::Native(NativeFunction::RadialGradient),
    );
    let mut namespace = IndexMap::new();
    namespace.insert("graphic".to_owned(), ScriptValue::Object(graphic));
    ScriptValue::Object(namespace)
}

/// An evaluation context with the two permitted bindings.
#[derive(Debug, Clone)]
pub struct Sandbox {
    placeholder: String,
    data: ScriptValue,
    limits: SandboxLimits,
}

impl Sandbox {
    /// Creates a sandbox binding `placeholder` to `data`.
    #[must_use]
    pub fn new(placeholder: impl Into<String>, data: ScriptValue, limits: SandboxLimits) -> Self {
        Self {
            placeholder: placeholder.into(),
            data,
            limits,
        }
    }

    /// Sandbox whose placeholder evaluates to its own name, so templated text
    /// parses back into a templated object.
    #[must_use]
    pub fn with_placeholder_echo(placeholder: &str, limits: SandboxLimits) -> Self {
        Self::new(
            placeholder,
            ScriptValue::String(placeholder.to_owned()),
            limits,
        )
    }

    fn interpreter(&self) -> Interpreter {
        let mut globals = IndexMap::with_capacity(2);
        globals.insert(CHARTING_NAMESPACE.to_owned(), charting_namespace());
        globals.insert(self.placeholder.clone(), self.data.clone());
        Interpreter::new(globals, self.limits)
    }

    /// Evaluates `source` as a single expression.
    pub fn eval_expression(&self, source: &str) -> ScriptResult<ScriptValue> {
        let expr = Parser::new(source, self.limits.max_depth)?.parse_expression()?;
        self.interpreter().eval(&expr)
    }

    /// Runs `source` as the body of `function () { let option; <source>; return option; }`.
    pub fn run_option_body(&self, source: &str) -> ScriptResult<ScriptValue> {
        let body = Parser::new(source, self.limits.max_depth)?.parse_program()?;
        let mut interpreter = self.interpreter();
        interpreter.declare_program_binding("option", ScriptValue::Undefined);
        let (returned, _) = interpreter.run_program(&body)?;
        Ok(match returned {
            Some(value) => value,
            None => interpreter
                .lookup("option")
                .cloned()
                .unwrap_or(ScriptValue::Undefined),
        })
    }

    /// Evaluates template text: a bare expression when it is one, otherwise a
    /// statement list yielding its `return` value, its `option` object, or a
    /// trailing bare object literal, in that order.
    pub fn run_template_body(&self, source: &str) -> ScriptResult<ScriptValue> {
        match self.eval_expression(source) {
            Ok(value) => return Ok(value),
            Err(err) => trace!(error = %err, "template is not a single expression"),
        }

        let body = Parser::new(source, self.limits.max_depth)?.parse_program()?;
        let mut interpreter = self.interpreter();
        interpreter.declare_program_binding("option", ScriptValue::Undefined);
        let (returned, completion) = interpreter.run_program(&body)?;
        if let Some(value) = returned {
            return Ok(value);
        }
        if let Some(option @ ScriptValue::Object(_)) = interpreter.lookup("option") {
            return Ok(option.clone());
        }
        match completion {
            Some(value @ ScriptValue::Object(_)) => Ok(value),
            _ => Err(ScriptError::NotAnObject),
        }
    }
}

/// Converts an evaluation result to a JSON object, rejecting everything else.
pub fn into_object(value: ScriptValue) -> ScriptResult<Map<String, Value>> {
    match value.to_json() {
        Value::Object(map) if matches!(value, ScriptValue::Object(_)) => Ok(map),
        _ => Err(ScriptError::NotAnObject),
    }
}
