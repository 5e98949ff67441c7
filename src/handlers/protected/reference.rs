// handlers/protected/reference.rs - Generic handlers for /api/{table}
//
// One set of handlers serves every reference table; the router binds the
// table with an Extension layer per sub-router.

use axum::extract::{Extension, Path, State};
use serde::Deserialize;

use crate::database::models::{ReferenceEntry, ReferenceTable};
use crate::handlers::extract::{parse_id, ApiJson};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NameBody {
    pub name: Option<String>,
}

/// GET /api/:table - All entries ordered by id
pub async fn list(
    State(state): State<AppState>,
    Extension(table): Extension<ReferenceTable>,
) -> ApiResult<Vec<ReferenceEntry>> {
    let entries = state.references(table).list_all().await?;
    let count = entries.len() as i64;
    Ok(ApiResponse::success(entries).with_count(count))
}

/// GET /api/:table/count
pub async fn count(
    State(state): State<AppState>,
    Extension(table): Extension<ReferenceTable>,
) -> ApiResult<()> {
    Ok(ApiResponse::count(state.references(table).count().await?))
}

/// GET /api/:table/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(table): Extension<ReferenceTable>,
    Path(id): Path<String>,
) -> ApiResult<ReferenceEntry> {
    let entry = state.references(table).get_by_id(parse_id(&id)?).await?;
    Ok(ApiResponse::success(entry))
}

/// POST /api/:table - `{name}`; 409 DUPLICATE_NAME on a case-insensitive match
pub async fn create(
    State(state): State<AppState>,
    Extension(table): Extension<ReferenceTable>,
    ApiJson(body): ApiJson<NameBody>,
) -> ApiResult<ReferenceEntry> {
    let entry = state.references(table).create(body.name.as_deref()).await?;
    Ok(ApiResponse::created(entry).with_message("Record created successfully"))
}

/// PUT /api/:table/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(table): Extension<ReferenceTable>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<NameBody>,
) -> ApiResult<ReferenceEntry> {
    let entry = state
        .references(table)
        .update(parse_id(&id)?, body.name.as_deref())
        .await?;
    Ok(ApiResponse::success(entry).with_message("Record updated successfully"))
}

/// DELETE /api/:table/:id - 409 FOREIGN_KEY_CONSTRAINT while referenced
pub async fn delete(
    State(state): State<AppState>,
    Extension(table): Extension<ReferenceTable>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.references(table).delete(parse_id(&id)?).await?;
    Ok(ApiResponse::message("Record deleted successfully"))
}
