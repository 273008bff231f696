// End-to-end pipeline tests: submit, poll, inspect bindings, read outputs back

use common::bindings::BindingResolver;
use common::config::{
    DynamicAllocationConfig, EngineConfig, OutputFailurePolicy, PartialBindingPolicy,
};
use common::dataset::{Column, DataType, Dataset};
use common::formats;
use common::models::{
    ExecutionMode, FileFormat, InputDescriptor, Job, JobRequest, JobStatus, OutputDescriptor,
    OutputStatus,
};
use common::registry::{InMemoryJobStore, JobRegistry};
use common::script::{AssignmentEvaluator, DistributedBackend, InMemoryBackend};
use common::sink::SinkWriter;
use common::source::SourceReader;
use common::storage::{MemoryObjectStore, ObjectStore};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

fn setup() -> (JobRegistry, Arc<MemoryObjectStore>) {
    let store = Arc::new(MemoryObjectStore::new());
    let object_store: Arc<dyn ObjectStore> = store.clone();

    let reader = SourceReader::new(object_store.clone());
    let resolver = BindingResolver::new(reader, PartialBindingPolicy::OmitFailed);
    let sinks = SinkWriter::new(object_store);

    let evaluator = Arc::new(AssignmentEvaluator::new());
    let engine = EngineConfig {
        local_master: "local[*]".to_string(),
        static_master: String::new(),
        managed_master: String::new(),
        namespace: "datalab-test".to_string(),
        container_image: String::new(),
        dynamic_allocation: DynamicAllocationConfig::default(),
    };

    let registry = JobRegistry::new(
        Arc::new(InMemoryJobStore::new(0)),
        resolver,
        sinks,
        InMemoryBackend::new(evaluator.clone()),
        DistributedBackend::new(evaluator, engine),
        OutputFailurePolicy::ExecutionOnly,
    );
    (registry, store)
}

async fn wait_for_terminal(registry: &JobRegistry, id: Uuid) -> Job {
    for _ in 0..500 {
        let job = registry.get(id).await.expect("job should exist");
        if job.status.is_terminal() {
            return job;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("timeout waiting for job {}", id);
}

#[tokio::test]
async fn test_full_pipeline_csv_in_parquet_out() {
    let (registry, store) = setup();

    // Seed a csv input
    store
        .put_object("data/sales.csv", b"region;amount\nnorth;10\nsouth;20\n")
        .await
        .unwrap();

    let mut inputs = HashMap::new();
    inputs.insert(
        "sales".to_string(),
        InputDescriptor::File {
            url: "s3://datalab/data/sales.csv".to_string(),
            filetype: FileFormat::Csv,
        },
    );
    let mut outputs = HashMap::new();
    outputs.insert(
        "report".to_string(),
        OutputDescriptor::File {
            url: "s3://datalab/out/report.parquet".to_string(),
            filetype: FileFormat::Parquet,
        },
    );

    let id = registry
        .submit(JobRequest {
            script: "report := sales;".to_string(),
            mode: ExecutionMode::InMemory,
            target: None,
            inputs,
            outputs,
        })
        .await
        .unwrap();

    let job = wait_for_terminal(&registry, id).await;
    assert_eq!(job.status, JobStatus::Done);
    assert!(job.completed_at.is_some());
    assert_eq!(job.outputs["report"].status, OutputStatus::Done);
    assert_eq!(job.outputs["report"].location, "s3://datalab/out/report.parquet");

    // Bindings are poll-able after completion
    let bindings = registry.bindings(id).await.unwrap();
    let report = &bindings["report"];
    assert_eq!(report.row_count(), 2);
    assert_eq!(report.get_value(0, "region"), Some(&json!("north")));
    assert_eq!(report.get_value(1, "amount"), Some(&json!(20)));

    // The written parquet decodes to the same dataset
    let bytes = store.get_object("out/report.parquet").await.unwrap();
    let written = formats::decode(FileFormat::Parquet, &bytes).unwrap();
    assert_eq!(written.rows, report.rows);
}

#[tokio::test]
async fn test_parquet_input_chained_script() {
    let (registry, store) = setup();

    let seed = Dataset::new(
        vec![
            Column::new("id", DataType::Integer),
            Column::new("name", DataType::String),
        ],
        vec![vec![json!(1), json!("x")], vec![json!(2), json!("y")]],
    );
    let bytes = formats::encode(FileFormat::Parquet, &seed).unwrap();
    store.put_object("seed.parquet", &bytes).await.unwrap();

    let mut inputs = HashMap::new();
    inputs.insert(
        "seed".to_string(),
        InputDescriptor::File {
            url: "seed.parquet".to_string(),
            filetype: FileFormat::Parquet,
        },
    );
    let mut outputs = HashMap::new();
    outputs.insert(
        "final".to_string(),
        OutputDescriptor::File {
            url: "final.csv".to_string(),
            filetype: FileFormat::Csv,
        },
    );

    let id = registry
        .submit(JobRequest {
            script: "staged := seed; final := staged;".to_string(),
            mode: ExecutionMode::InMemory,
            target: None,
            inputs,
            outputs,
        })
        .await
        .unwrap();

    let job = wait_for_terminal(&registry, id).await;
    assert_eq!(job.status, JobStatus::Done);

    // Intermediate bindings are visible too
    let bindings = registry.bindings(id).await.unwrap();
    assert!(bindings.contains_key("staged"));
    assert!(bindings.contains_key("final"));

    let bytes = store.get_object("final.csv").await.unwrap();
    let written = formats::decode(FileFormat::Csv, &bytes).unwrap();
    assert_eq!(written.row_count(), 2);
    assert_eq!(written.columns.len(), 2);
}

#[tokio::test]
async fn test_failed_job_is_observable_via_polling() {
    let (registry, _store) = setup();

    let mut outputs = HashMap::new();
    outputs.insert(
        "out".to_string(),
        OutputDescriptor::File {
            url: "never.csv".to_string(),
            filetype: FileFormat::Csv,
        },
    );

    let id = registry
        .submit(JobRequest {
            script: "out := does_not_exist;".to_string(),
            mode: ExecutionMode::InMemory,
            target: None,
            inputs: HashMap::new(),
            outputs,
        })
        .await
        .unwrap();

    let job = wait_for_terminal(&registry, id).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.is_some());
    assert_eq!(job.outputs["out"].status, OutputStatus::Pending);
    // Bindings stay empty for a failed execution
    assert!(registry.bindings(id).await.unwrap().is_empty());
}
