// In-memory script backend: evaluation on the service's own runtime

use crate::errors::ScriptError;
use crate::models::Bindings;
use crate::script::{ScriptBackend, ScriptEvaluator};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

/// Runs the evaluator in-process, no engine session involved
#[derive(Clone)]
pub struct InMemoryBackend {
    evaluator: Arc<dyn ScriptEvaluator>,
}

impl InMemoryBackend {
    pub fn new(evaluator: Arc<dyn ScriptEvaluator>) -> Self {
        Self { evaluator }
    }
}

#[async_trait]
impl ScriptBackend for InMemoryBackend {
    #[instrument(skip(self, script, bindings), fields(backend = "in_memory", inputs = bindings.len()))]
    async fn execute(&self, script: &str, bindings: Bindings) -> Result<Bindings, ScriptError> {
        self.evaluator.evaluate(script, bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, DataType, Dataset};
    use crate::script::AssignmentEvaluator;
    use serde_json::json;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_execute_delegates_to_evaluator() {
        let backend = InMemoryBackend::new(Arc::new(AssignmentEvaluator::new()));
        let mut bindings = HashMap::new();
        bindings.insert(
            "input".to_string(),
            Dataset::new(vec![Column::new("v", DataType::Integer)], vec![vec![json!(1)]]),
        );

        let result = backend.execute("out := input;", bindings).await.unwrap();
        assert!(result.contains_key("out"));
    }
}
