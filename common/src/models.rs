use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::dataset::Dataset;

/// Named datasets available to or produced by script execution
pub type Bindings = HashMap<String, Dataset>;

// ============================================================================
// Submission Models
// ============================================================================

/// How the script is executed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    InMemory,
    Distributed,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::InMemory => write!(f, "in_memory"),
            ExecutionMode::Distributed => write!(f, "distributed"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_memory" => Ok(ExecutionMode::InMemory),
            "distributed" => Ok(ExecutionMode::Distributed),
            _ => Err(format!("Invalid execution mode: {}", s)),
        }
    }
}

/// Deployment context a distributed backend runs against
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionTarget {
    Local,
    ClusterStatic,
    ClusterManaged,
}

impl std::fmt::Display for ExecutionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionTarget::Local => write!(f, "local"),
            ExecutionTarget::ClusterStatic => write!(f, "cluster_static"),
            ExecutionTarget::ClusterManaged => write!(f, "cluster_managed"),
        }
    }
}

impl FromStr for ExecutionTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(ExecutionTarget::Local),
            "cluster_static" => Ok(ExecutionTarget::ClusterStatic),
            "cluster_managed" => Ok(ExecutionTarget::ClusterManaged),
            _ => Err(format!("Invalid execution target: {}", s)),
        }
    }
}

/// Supported database systems for query sources and table sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseKind {
    #[serde(rename = "postgresql")]
    PostgreSql,
    #[serde(rename = "mysql")]
    MySql,
    Oracle,
}

impl std::fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseKind::PostgreSql => write!(f, "postgresql"),
            DatabaseKind::MySql => write!(f, "mysql"),
            DatabaseKind::Oracle => write!(f, "oracle"),
        }
    }
}

/// File formats supported for object-store sources and sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Csv => write!(f, "csv"),
            FileFormat::Parquet => write!(f, "parquet"),
        }
    }
}

/// Caller-supplied specification of where to read an input binding from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputDescriptor {
    Query {
        dbtype: DatabaseKind,
        url: String,
        user: String,
        password: String,
        query: String,
    },
    File {
        url: String,
        filetype: FileFormat,
    },
}

/// Caller-supplied specification of where to write an output binding to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputDescriptor {
    Table {
        dbtype: DatabaseKind,
        url: String,
        user: String,
        password: String,
        table: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role_url: Option<String>,
    },
    File {
        url: String,
        filetype: FileFormat,
    },
}

impl OutputDescriptor {
    /// Human-readable sink address, recorded on the Output
    pub fn location(&self) -> String {
        match self {
            OutputDescriptor::Table { url, table, .. } => format!("{}/{}", url, table),
            OutputDescriptor::File { url, .. } => url.clone(),
        }
    }
}

/// A complete job submission: script, backend selection and named bindings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub script: String,
    pub mode: ExecutionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ExecutionTarget>,
    #[serde(default)]
    pub inputs: HashMap<String, InputDescriptor>,
    #[serde(default)]
    pub outputs: HashMap<String, OutputDescriptor>,
}

// ============================================================================
// Job Models
// ============================================================================

/// Lifecycle of a job: monotone Running -> (Done | Failed)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Running => write!(f, "running"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Lifecycle of a single declared output within a job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl std::fmt::Display for OutputStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputStatus::Pending => write!(f, "pending"),
            OutputStatus::Running => write!(f, "running"),
            OutputStatus::Done => write!(f, "done"),
            OutputStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Per-output write tracking; mutated once by the write step for its name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub location: String,
    pub status: OutputStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Output {
    pub fn pending(location: String) -> Self {
        Self {
            location,
            status: OutputStatus::Pending,
            error: None,
        }
    }
}

/// One asynchronous run of a script against resolved bindings.
///
/// Created on submission, mutated only by the pipeline task that owns it,
/// kept for process lifetime (subject to the registry's TTL eviction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub definition: JobRequest,
    pub status: JobStatus,
    /// Populated exactly once, after the execution step completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bindings: Option<Bindings>,
    pub outputs: HashMap<String, Output>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a freshly submitted job: Running, one Pending output per
    /// declared output name, bindings unset.
    pub fn new(id: Uuid, definition: JobRequest) -> Self {
        let outputs = definition
            .outputs
            .iter()
            .map(|(name, descriptor)| (name.clone(), Output::pending(descriptor.location())))
            .collect();

        Self {
            id,
            definition,
            status: JobStatus::Running,
            bindings: None,
            outputs,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_descriptor_serde_tags() {
        let query = InputDescriptor::Query {
            dbtype: DatabaseKind::PostgreSql,
            url: "postgresql://localhost:5432/db".to_string(),
            user: "u".to_string(),
            password: "p".to_string(),
            query: "SELECT 1".to_string(),
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["kind"], "query");
        assert_eq!(json["dbtype"], "postgresql");

        let file = InputDescriptor::File {
            url: "s3://bucket/data.csv".to_string(),
            filetype: FileFormat::Csv,
        };
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["kind"], "file");
        assert_eq!(json["filetype"], "csv");
    }

    #[test]
    fn test_output_descriptor_location() {
        let table = OutputDescriptor::Table {
            dbtype: DatabaseKind::PostgreSql,
            url: "postgresql://localhost/db".to_string(),
            user: "u".to_string(),
            password: "p".to_string(),
            table: "results".to_string(),
            role_url: None,
        };
        assert_eq!(table.location(), "postgresql://localhost/db/results");

        let file = OutputDescriptor::File {
            url: "s3://bucket/out.parquet".to_string(),
            filetype: FileFormat::Parquet,
        };
        assert_eq!(file.location(), "s3://bucket/out.parquet");
    }

    #[test]
    fn test_new_job_starts_running_with_pending_outputs() {
        let mut outputs = HashMap::new();
        outputs.insert(
            "result".to_string(),
            OutputDescriptor::File {
                url: "s3://bucket/out.csv".to_string(),
                filetype: FileFormat::Csv,
            },
        );
        let request = JobRequest {
            script: "result := input;".to_string(),
            mode: ExecutionMode::InMemory,
            target: None,
            inputs: HashMap::new(),
            outputs,
        };

        let job = Job::new(Uuid::new_v4(), request);
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.bindings.is_none());
        assert_eq!(job.outputs.len(), 1);
        assert_eq!(job.outputs["result"].status, OutputStatus::Pending);
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn test_execution_target_from_str() {
        assert_eq!(
            "cluster_managed".parse::<ExecutionTarget>().unwrap(),
            ExecutionTarget::ClusterManaged
        );
        assert!("yarn".parse::<ExecutionTarget>().is_err());
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}
