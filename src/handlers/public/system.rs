// handlers/public/system.rs - Service index, health check and 404 fallback

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET / - Service description and endpoint index
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Payroll API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "auth": "/login, /register (public); /me, /verify (protected)",
                "workers": "/workers[/:id], /workers/count (protected)",
                "history": "/list[/:id], /list/count, aliased as /history (protected)",
                "reference": "/api/{positions|professions|education|genders|actions}[/:id], /count (protected)",
                "health": "/health (public)",
            }
        }
    }))
}

/// GET /health - Liveness plus a database round trip
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "database": "ok",
                "timestamp": timestamp,
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "database": "unavailable",
                    "timestamp": timestamp,
                })),
            )
        }
    }
}

/// Fallback for unmatched routes
pub async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::route_not_found(uri.path())
}
