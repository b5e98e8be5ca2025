use regex::Regex;
use tracing::{debug, trace};

use crate::error::{ChartError, ChartResult};
use crate::script::{Sandbox, SandboxLimits, ScriptError, into_object, strip_type_annotations};

use super::ChartOption;

/// Assignment shapes tried by the extraction strategy, in precedence order.
/// Each must span the whole text, an optional trailing `;` aside.
const ASSIGNMENT_PATTERNS: [&str; 4] = [
    r"(?s)^\s*(?:var|let|const)\s+option\s*=\s*(\{.*\})\s*;?\s*$",
    r"(?s)^\s*option\s*=\s*(\{.*\})\s*;?\s*$",
    r"(?s)^\s*(?:var|let|const)\s+config\s*=\s*(\{.*\})\s*;?\s*$",
    r"(?s)^\s*config\s*=\s*(\{.*\})\s*;?\s*$",
];

/// Which strategy produced a parsed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// The text ran as a function body and left an object in `option`.
    FullExecution,
    /// A whole-text `option = {...}` / `config = {...}` assignment.
    AssignmentExtraction,
    /// The outermost `{ ... }` span evaluated as a literal.
    BraceScan,
}

/// Turns free-form config source text into a plain option object.
#[derive(Debug, Clone)]
pub struct ConfigParser {
    sandbox: Sandbox,
    assignments: Vec<Regex>,
}

impl ConfigParser {
    /// Placeholder occurrences evaluate to the placeholder string itself, so a
    /// templated config parses into a still-templated object.
    pub fn new(placeholder: &str, limits: SandboxLimits) -> ChartResult<Self> {
        let assignments = ASSIGNMENT_PATTERNS
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    ChartError::InvalidConfig(format!("invalid assignment pattern: {e}"))
                })
            })
            .collect::<ChartResult<Vec<_>>>()?;
        Ok(Self {
            sandbox: Sandbox::with_placeholder_echo(placeholder, limits),
            assignments,
        })
    }

    /// Parses `text`, failing only when every strategy fails.
    pub fn parse(&self, text: &str) -> ChartResult<ChartOption> {
        self.parse_with_strategy(text).map(|(option, _)| option)
    }

    /// Like [`ConfigParser::parse`], also reporting the strategy that won.
    pub fn parse_with_strategy(&self, text: &str) -> ChartResult<(ChartOption, ParseStrategy)> {
        let clean = strip_type_annotations(text);
        let mut last_error = None;

        if clean.contains("option") {
            match self
                .sandbox
                .run_option_body(&clean)
                .and_then(into_object)
            {
                Ok(option) => return Ok(accepted(option, ParseStrategy::FullExecution)),
                Err(err) => {
                    trace!(error = %err, "full execution strategy failed");
                    last_error = Some(err);
                }
            }
        }

        match self.extract_assignment(&clean) {
            Some(Ok(option)) => return Ok(accepted(option, ParseStrategy::AssignmentExtraction)),
            Some(Err(err)) => {
                trace!(error = %err, "assignment extraction strategy failed");
                last_error = Some(err);
            }
            None => trace!("no whole-text assignment found"),
        }

        match self.brace_scan(&clean) {
            Some(Ok(option)) => return Ok(accepted(option, ParseStrategy::BraceScan)),
            Some(Err(err)) => {
                trace!(error = %err, "brace scan strategy failed");
                last_error = Some(err);
            }
            None => trace!("no braces to scan"),
        }

        let detail = match last_error {
            Some(err) => err.to_string(),
            None => "text contains no object literal".to_owned(),
        };
        Err(ChartError::ConfigParse(detail))
    }

    fn extract_assignment(&self, clean: &str) -> Option<Result<ChartOption, ScriptError>> {
        let literal = self
            .assignments
            .iter()
            .find_map(|pattern| pattern.captures(clean))
            .and_then(|captures| captures.get(1))?;
        Some(self.evaluate_literal(literal.as_str()))
    }

    fn brace_scan(&self, clean: &str) -> Option<Result<ChartOption, ScriptError>> {
        let trimmed = clean.trim();
        if trimmed.starts_with('{') {
            let literal = trimmed.strip_suffix(';').unwrap_or(trimmed);
            return Some(self.evaluate_literal(literal));
        }
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        if end < start {
            return None;
        }
        Some(self.evaluate_literal(&trimmed[start..=end]))
    }

    fn evaluate_literal(&self, literal: &str) -> Result<ChartOption, ScriptError> {
        self.sandbox.eval_expression(literal).and_then(into_object)
    }
}

fn accepted(option: ChartOption, strategy: ParseStrategy) -> (ChartOption, ParseStrategy) {
    debug!(?strategy, keys = option.len(), "parsed config text");
    (option, strategy)
}
