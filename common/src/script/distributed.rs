// Distributed script backend: per-target engine sessions
//
// Cluster bootstrap is outside this service; a session carries the resolved
// master endpoint and allocation parameters for the chosen target and
// delegates evaluation to the injected evaluator.

use crate::config::{DynamicAllocationConfig, EngineConfig};
use crate::errors::{ScriptError, SubmitError};
use crate::models::{Bindings, ExecutionTarget};
use crate::script::{ScriptBackend, ScriptEvaluator};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

/// Resolves execution targets to engine sessions
#[derive(Clone)]
pub struct DistributedBackend {
    evaluator: Arc<dyn ScriptEvaluator>,
    engine: EngineConfig,
}

impl DistributedBackend {
    pub fn new(evaluator: Arc<dyn ScriptEvaluator>, engine: EngineConfig) -> Self {
        Self { evaluator, engine }
    }

    /// Build a session for `target`. Targets without a configured master
    /// endpoint are rejected, which makes the check usable at submission
    /// time before any job state exists.
    pub fn session(&self, target: ExecutionTarget) -> Result<EngineSession, SubmitError> {
        let master_url = self
            .engine
            .master_url(target)
            .ok_or_else(|| SubmitError::UnknownTarget(target.to_string()))?
            .to_string();

        // Dynamic executor allocation only applies to the managed target
        let dynamic_allocation = (target == ExecutionTarget::ClusterManaged
            && self.engine.dynamic_allocation.enabled)
            .then(|| self.engine.dynamic_allocation.clone());

        Ok(EngineSession {
            target,
            master_url,
            namespace: self.engine.namespace.clone(),
            container_image: self.engine.container_image.clone(),
            dynamic_allocation,
            evaluator: self.evaluator.clone(),
        })
    }
}

/// A resolved engine session for one job run
#[derive(Clone)]
pub struct EngineSession {
    pub target: ExecutionTarget,
    pub master_url: String,
    pub namespace: String,
    pub container_image: String,
    pub dynamic_allocation: Option<DynamicAllocationConfig>,
    evaluator: Arc<dyn ScriptEvaluator>,
}

impl std::fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("target", &self.target)
            .field("master_url", &self.master_url)
            .field("namespace", &self.namespace)
            .field("container_image", &self.container_image)
            .field("dynamic_allocation", &self.dynamic_allocation)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ScriptBackend for EngineSession {
    #[instrument(
        skip(self, script, bindings),
        fields(backend = "distributed", target = %self.target, master = %self.master_url)
    )]
    async fn execute(&self, script: &str, bindings: Bindings) -> Result<Bindings, ScriptError> {
        if let Some(alloc) = &self.dynamic_allocation {
            info!(
                min_executors = alloc.min_executors,
                max_executors = alloc.max_executors,
                namespace = %self.namespace,
                "Executing with dynamic executor allocation"
            );
        } else {
            info!("Executing on distributed engine");
        }
        self.evaluator.evaluate(script, bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::AssignmentEvaluator;

    fn engine_config() -> EngineConfig {
        EngineConfig {
            local_master: "local[*]".to_string(),
            static_master: "engine://cluster:7077".to_string(),
            managed_master: String::new(),
            namespace: "datalab".to_string(),
            container_image: "datalab-engine:latest".to_string(),
            dynamic_allocation: DynamicAllocationConfig {
                enabled: true,
                min_executors: 1,
                max_executors: 4,
            },
        }
    }

    fn backend() -> DistributedBackend {
        DistributedBackend::new(Arc::new(AssignmentEvaluator::new()), engine_config())
    }

    #[test]
    fn test_session_resolves_master_per_target() {
        let backend = backend();

        let local = backend.session(ExecutionTarget::Local).unwrap();
        assert_eq!(local.master_url, "local[*]");
        assert!(local.dynamic_allocation.is_none());

        let cluster = backend.session(ExecutionTarget::ClusterStatic).unwrap();
        assert_eq!(cluster.master_url, "engine://cluster:7077");
        assert!(cluster.dynamic_allocation.is_none());
    }

    #[test]
    fn test_unconfigured_target_is_rejected() {
        let backend = backend();
        let err = backend
            .session(ExecutionTarget::ClusterManaged)
            .unwrap_err();
        assert!(matches!(err, SubmitError::UnknownTarget(_)));
    }

    #[test]
    fn test_managed_target_enables_dynamic_allocation() {
        let mut config = engine_config();
        config.managed_master = "engine://managed".to_string();
        let backend =
            DistributedBackend::new(Arc::new(AssignmentEvaluator::new()), config);

        let session = backend.session(ExecutionTarget::ClusterManaged).unwrap();
        let alloc = session.dynamic_allocation.expect("allocation enabled");
        assert_eq!(alloc.max_executors, 4);
    }
}
