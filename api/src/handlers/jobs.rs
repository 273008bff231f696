use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::models::{
    Bindings, ExecutionMode, ExecutionTarget, InputDescriptor, Job, JobRequest, OutputDescriptor,
};

/// Backend selection, passed as query parameters
#[derive(Debug, Deserialize)]
pub struct ExecuteParams {
    pub mode: String,
    pub target: Option<String>,
}

/// Script and bindings, passed as the request body
#[derive(Debug, Deserialize)]
pub struct ExecuteBody {
    pub script: String,
    #[serde(default)]
    pub inputs: HashMap<String, InputDescriptor>,
    #[serde(default)]
    pub outputs: HashMap<String, OutputDescriptor>,
}

/// Submit a job for asynchronous execution
#[tracing::instrument(skip(state, body), fields(mode = %params.mode))]
pub async fn execute(
    State(state): State<AppState>,
    Query(params): Query<ExecuteParams>,
    Json(body): Json<ExecuteBody>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let mode: ExecutionMode = params
        .mode
        .parse()
        .map_err(|e: String| ErrorResponse::new("validation_error", e))?;
    let target: Option<ExecutionTarget> = params
        .target
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(|e: String| ErrorResponse::new("validation_error", e))?;

    let request = JobRequest {
        script: body.script,
        mode,
        target,
        inputs: body.inputs,
        outputs: body.outputs,
    };

    let id = state.registry.submit(request).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/v2/job/{}", id))],
        Json(SuccessResponse::new(id)),
    ))
}

/// Poll a job record
#[tracing::instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Job>>, ErrorResponse> {
    let job = state.registry.get(id).await?;
    Ok(Json(SuccessResponse::new(job)))
}

/// Poll the bindings a job produced; empty until execution completes
#[tracing::instrument(skip(state))]
pub async fn get_bindings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Bindings>>, ErrorResponse> {
    let bindings = state.registry.bindings(id).await?;
    Ok(Json(SuccessResponse::new(bindings)))
}
