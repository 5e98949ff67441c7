// handlers/protected/history.rs - Payroll events, served at /list and /history

use axum::extract::{Path, State};

use crate::database::models::HistoryEvent;
use crate::handlers::extract::{parse_id, ApiJson};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::HistoryPayload;
use crate::state::AppState;

/// GET /list - Events ordered by date, then id, newest first
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<HistoryEvent>> {
    let events = state.history().list_all().await?;
    let count = events.len() as i64;
    Ok(ApiResponse::success(events).with_count(count))
}

/// GET /list/count
pub async fn count(State(state): State<AppState>) -> ApiResult<()> {
    Ok(ApiResponse::count(state.history().count().await?))
}

/// GET /list/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<HistoryEvent> {
    let event = state.history().get_by_id(parse_id(&id)?).await?;
    Ok(ApiResponse::success(event))
}

/// POST /list - Requires workers_id, actions_id, sum; date defaults to today
pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<HistoryPayload>,
) -> ApiResult<HistoryEvent> {
    let event = state.history().create(payload).await?;
    Ok(ApiResponse::created(event).with_message("History record created successfully"))
}

/// PUT /list/:id - Omitted date keeps the stored one
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<HistoryPayload>,
) -> ApiResult<HistoryEvent> {
    let event = state.history().update(parse_id(&id)?, payload).await?;
    Ok(ApiResponse::success(event).with_message("History record updated successfully"))
}

/// DELETE /list/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.history().delete(parse_id(&id)?).await?;
    Ok(ApiResponse::message("History record deleted successfully"))
}
