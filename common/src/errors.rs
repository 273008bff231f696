// Error handling framework
//
// One enum per failure domain. Only submission-time validation errors are
// returned synchronously to callers; source/script/sink failures are captured
// into Job and Output state and observed by polling.

use thiserror::Error;
use uuid::Uuid;

/// Input binding load failures. Recovered per-binding under the
/// omit-on-failure policy; never fatal to the job by themselves.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Read failed for '{path}': {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to decode dataset: {0}")]
    Decode(String),
}

/// Per-output write failures. Recorded on the failing Output only; other
/// outputs are unaffected.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Write failed for '{location}': {reason}")]
    WriteFailed { location: String, reason: String },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Script did not produce binding '{0}'")]
    MissingBinding(String),

    #[error("Failed to encode dataset: {0}")]
    Encode(String),
}

/// Script execution failures. Fatal to the job: recorded in `Job.error`,
/// job status moves to Failed, no sink write is attempted.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Syntax error at statement {statement}: {reason}")]
    Syntax { statement: usize, reason: String },

    #[error("Undefined reference: {0}")]
    UndefinedReference(String),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("No execution engine configured for target '{0}'")]
    SessionUnavailable(String),
}

/// Submission-time validation failures, surfaced synchronously before any
/// asynchronous work starts. The job is never created.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Execution target is required for distributed mode")]
    MissingTarget,

    #[error("Unknown execution target: {0}")]
    UnknownTarget(String),

    #[error("Invalid job request: {0}")]
    InvalidRequest(String),
}

/// Job lookup failures
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),
}

/// Object-store transport failures, wrapped into Source/Sink errors at the
/// reader/writer boundary
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object store error: {0}")]
    ObjectStore(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials: {0}")]
    Credentials(String),
}

/// Authentication failures
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,
}

impl From<StorageError> for SourceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => SourceError::ReadFailed {
                path,
                reason: "object not found".to_string(),
            },
            other => SourceError::ConnectionFailed(other.to_string()),
        }
    }
}

impl From<StorageError> for SinkError {
    fn from(err: StorageError) -> Self {
        SinkError::ConnectionFailed(err.to_string())
    }
}
