// handlers/protected/workers.rs - /workers CRUD

use axum::extract::{Path, State};

use crate::database::models::WorkerDetails;
use crate::handlers::extract::{parse_id, ApiJson};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::WorkerPayload;
use crate::state::AppState;

/// GET /workers - All workers, newest first, with reference names joined
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<WorkerDetails>> {
    let workers = state.workers().list_all().await?;
    let count = workers.len() as i64;
    Ok(ApiResponse::success(workers).with_count(count))
}

/// GET /workers/count
pub async fn count(State(state): State<AppState>) -> ApiResult<()> {
    Ok(ApiResponse::count(state.workers().count().await?))
}

/// GET /workers/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<WorkerDetails> {
    let worker = state.workers().get_by_id(parse_id(&id)?).await?;
    Ok(ApiResponse::success(worker))
}

/// POST /workers - Requires name, fam, gender_id, prof_id, position_id, salary, education_id
pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<WorkerPayload>,
) -> ApiResult<WorkerDetails> {
    let worker = state.workers().create(payload).await?;
    Ok(ApiResponse::created(worker).with_message("Worker created successfully"))
}

/// PUT /workers/:id - Full replacement; same required fields as create
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<WorkerPayload>,
) -> ApiResult<WorkerDetails> {
    let worker = state.workers().update(parse_id(&id)?, payload).await?;
    Ok(ApiResponse::success(worker).with_message("Worker updated successfully"))
}

/// DELETE /workers/:id - 409 while payroll history references the worker
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.workers().delete(parse_id(&id)?).await?;
    Ok(ApiResponse::message("Worker deleted successfully"))
}
