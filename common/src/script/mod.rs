// Script execution backends

pub mod distributed;
pub mod evaluator;
pub mod memory;

use crate::errors::ScriptError;
use crate::models::Bindings;
use async_trait::async_trait;

pub use distributed::{DistributedBackend, EngineSession};
pub use evaluator::{AssignmentEvaluator, ScriptEvaluator};
pub use memory::InMemoryBackend;

/// Executes a script against resolved input bindings and returns the
/// bindings the script produced
#[async_trait]
pub trait ScriptBackend: Send + Sync {
    async fn execute(&self, script: &str, bindings: Bindings) -> Result<Bindings, ScriptError>;
}
