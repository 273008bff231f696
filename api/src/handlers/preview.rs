use axum::{extract::State, Json};

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::dataset::Dataset;
use common::models::InputDescriptor;

/// Preview endpoints return the dataset structure plus at most this many rows
const PREVIEW_LIMIT: usize = 1000;

/// Preview a database query source
#[tracing::instrument(skip(state, descriptor))]
pub async fn preview_query(
    State(state): State<AppState>,
    Json(descriptor): Json<InputDescriptor>,
) -> Result<Json<SuccessResponse<Dataset>>, ErrorResponse> {
    if !matches!(descriptor, InputDescriptor::Query { .. }) {
        return Err(ErrorResponse::new(
            "validation_error",
            "expected a query descriptor",
        ));
    }
    preview(&state, &descriptor).await
}

/// Preview an object-store file source
#[tracing::instrument(skip(state, descriptor))]
pub async fn preview_file(
    State(state): State<AppState>,
    Json(descriptor): Json<InputDescriptor>,
) -> Result<Json<SuccessResponse<Dataset>>, ErrorResponse> {
    if !matches!(descriptor, InputDescriptor::File { .. }) {
        return Err(ErrorResponse::new(
            "validation_error",
            "expected a file descriptor",
        ));
    }
    preview(&state, &descriptor).await
}

async fn preview(
    state: &AppState,
    descriptor: &InputDescriptor,
) -> Result<Json<SuccessResponse<Dataset>>, ErrorResponse> {
    let dataset = state.reader.load(descriptor, Some(PREVIEW_LIMIT)).await?;
    Ok(Json(SuccessResponse::new(dataset)))
}
