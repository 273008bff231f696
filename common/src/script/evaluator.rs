// Script evaluation collaborator.
//
// The transformation language itself is pluggable: backends delegate to a
// `ScriptEvaluator`, and deployments inject their own interpreter. The
// shipped `AssignmentEvaluator` covers assignment statements only, enough
// to run and test the full pipeline.

use crate::errors::ScriptError;
use crate::models::Bindings;
use tracing::debug;

/// Interpreter seam between backends and the transformation language
pub trait ScriptEvaluator: Send + Sync {
    /// Evaluate `script` with the given input bindings; the returned map
    /// holds every binding visible after the last statement
    fn evaluate(&self, script: &str, bindings: Bindings) -> Result<Bindings, ScriptError>;
}

/// Minimal evaluator: `name := source;` statements.
///
/// Each statement binds `name` to the dataset currently bound to `source`;
/// later statements see earlier assignments. Inputs stay visible in the
/// result map.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignmentEvaluator;

impl AssignmentEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl ScriptEvaluator for AssignmentEvaluator {
    fn evaluate(&self, script: &str, bindings: Bindings) -> Result<Bindings, ScriptError> {
        let mut scope = bindings;

        for (idx, statement) in script
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .enumerate()
        {
            let statement_no = idx + 1;
            let (name, source) = statement.split_once(":=").ok_or(ScriptError::Syntax {
                statement: statement_no,
                reason: "expected ':='".to_string(),
            })?;

            let name = name.trim();
            let source = source.trim();
            if !is_identifier(name) || !is_identifier(source) {
                return Err(ScriptError::Syntax {
                    statement: statement_no,
                    reason: format!("invalid identifier in '{}'", statement),
                });
            }

            let dataset = scope
                .get(source)
                .cloned()
                .ok_or_else(|| ScriptError::UndefinedReference(source.to_string()))?;

            debug!(name = %name, source = %source, "Assignment evaluated");
            scope.insert(name.to_string(), dataset);
        }

        Ok(scope)
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
