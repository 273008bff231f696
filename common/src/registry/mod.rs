// Job registry: submission, the asynchronous pipeline, and polling

pub mod store;

use crate::bindings::BindingResolver;
use crate::config::OutputFailurePolicy;
use crate::errors::{RegistryError, SinkError, SubmitError};
use crate::models::{
    Bindings, ExecutionMode, Job, JobRequest, JobStatus, OutputStatus,
};
use crate::script::{DistributedBackend, InMemoryBackend, ScriptBackend};
use crate::sink::SinkWriter;
use crate::telemetry;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

pub use store::{InMemoryJobStore, JobStore};

/// Owns the job lifecycle: validates submissions, spawns pipelines, and
/// answers polling queries from stored job state
#[derive(Clone)]
pub struct JobRegistry {
    store: Arc<dyn JobStore>,
    resolver: BindingResolver,
    sinks: SinkWriter,
    in_memory: InMemoryBackend,
    distributed: DistributedBackend,
    output_failure_policy: OutputFailurePolicy,
}

impl JobRegistry {
    pub fn new(
        store: Arc<dyn JobStore>,
        resolver: BindingResolver,
        sinks: SinkWriter,
        in_memory: InMemoryBackend,
        distributed: DistributedBackend,
        output_failure_policy: OutputFailurePolicy,
    ) -> Self {
        Self {
            store,
            resolver,
            sinks,
            in_memory,
            distributed,
            output_failure_policy,
        }
    }

    /// Validate and register a job, then start its pipeline.
    ///
    /// Validation failures are returned synchronously and leave no job
    /// behind; everything after this call surfaces through polling.
    #[instrument(skip(self, request), fields(mode = %request.mode))]
    pub async fn submit(&self, request: JobRequest) -> Result<Uuid, SubmitError> {
        if request.script.trim().is_empty() {
            return Err(SubmitError::InvalidRequest(
                "script cannot be empty".to_string(),
            ));
        }

        let backend: Arc<dyn ScriptBackend> = match request.mode {
            ExecutionMode::InMemory => Arc::new(self.in_memory.clone()),
            ExecutionMode::Distributed => {
                let target = request.target.ok_or(SubmitError::MissingTarget)?;
                Arc::new(self.distributed.session(target)?)
            }
        };

        let id = Uuid::new_v4();
        let job = Job::new(id, request);
        let definition = job.definition.clone();
        self.store.insert(job).await;

        telemetry::record_job_submitted(&definition.mode.to_string());
        info!(job_id = %id, "Job submitted");

        let store = self.store.clone();
        let resolver = self.resolver.clone();
        let sinks = self.sinks.clone();
        let policy = self.output_failure_policy;
        tokio::spawn(async move {
            run_pipeline(store, resolver, sinks, backend, policy, id, definition).await;
        });

        Ok(id)
    }

    /// Snapshot of a job record
    pub async fn get(&self, id: Uuid) -> Result<Job, RegistryError> {
        self.store
            .get(id)
            .await
            .ok_or(RegistryError::JobNotFound(id))
    }

    /// Bindings produced by a job; empty until execution completes
    pub async fn bindings(&self, id: Uuid) -> Result<Bindings, RegistryError> {
        let job = self.get(id).await?;
        Ok(job.bindings.unwrap_or_default())
    }
}

/// One job's full pipeline: resolve inputs, execute, persist outputs.
///
/// Never returns an error across the spawn boundary; every failure is
/// recorded into the job record instead.
#[instrument(skip(store, resolver, sinks, backend, definition), fields(job_id = %id))]
async fn run_pipeline(
    store: Arc<dyn JobStore>,
    resolver: BindingResolver,
    sinks: SinkWriter,
    backend: Arc<dyn ScriptBackend>,
    policy: OutputFailurePolicy,
    id: Uuid,
    definition: JobRequest,
) {
    let started = Instant::now();

    let input_bindings = match resolver.resolve(&definition.inputs).await {
        Ok(bindings) => bindings,
        Err(e) => {
            error!(job_id = %id, error = %e, "Input resolution failed");
            finalize(&store, id, JobStatus::Failed, Some(e.to_string()), started).await;
            return;
        }
    };

    let produced = match backend.execute(&definition.script, input_bindings).await {
        Ok(bindings) => bindings,
        Err(e) => {
            error!(job_id = %id, error = %e, "Script execution failed");
            finalize(&store, id, JobStatus::Failed, Some(e.to_string()), started).await;
            return;
        }
    };

    // Bindings become visible exactly once, before any write starts
    {
        let produced = produced.clone();
        store
            .update(id, Box::new(move |job| job.bindings = Some(produced)))
            .await;
    }

    let mut any_output_failed = false;
    for (name, descriptor) in &definition.outputs {
        {
            let name = name.clone();
            store
                .update(
                    id,
                    Box::new(move |job| {
                        if let Some(output) = job.outputs.get_mut(&name) {
                            output.status = OutputStatus::Running;
                        }
                    }),
                )
                .await;
        }

        let result = match produced.get(name) {
            Some(dataset) => sinks.persist(dataset, descriptor).await,
            None => Err(SinkError::MissingBinding(name.clone())),
        };

        let (status, output_error) = match result {
            Ok(()) => (OutputStatus::Done, None),
            Err(e) => {
                warn!(job_id = %id, output = %name, error = %e, "Output write failed");
                any_output_failed = true;
                (OutputStatus::Failed, Some(e.to_string()))
            }
        };

        let name = name.clone();
        store
            .update(
                id,
                Box::new(move |job| {
                    if let Some(output) = job.outputs.get_mut(&name) {
                        output.status = status;
                        output.error = output_error;
                    }
                }),
            )
            .await;
    }

    let (status, job_error) = match (any_output_failed, policy) {
        (true, OutputFailurePolicy::Aggregate) => (
            JobStatus::Failed,
            Some("one or more outputs failed".to_string()),
        ),
        _ => (JobStatus::Done, None),
    };
    finalize(&store, id, status, job_error, started).await;
}

async fn finalize(
    store: &Arc<dyn JobStore>,
    id: Uuid,
    status: JobStatus,
    job_error: Option<String>,
    started: Instant,
) {
    let duration = started.elapsed().as_secs_f64();
    {
        let job_error = job_error.clone();
        store
            .update(
                id,
                Box::new(move |job| {
                    job.status = status;
                    job.error = job_error;
                    job.completed_at = Some(chrono::Utc::now());
                }),
            )
            .await;
    }

    telemetry::record_job_duration(&id, duration);
    match status {
        JobStatus::Failed => {
            telemetry::record_job_failure(&id, job_error.as_deref().unwrap_or("unknown"));
        }
        _ => telemetry::record_job_success(&id),
    }
    info!(job_id = %id, status = %status, duration_seconds = duration, "Job finished");
}
