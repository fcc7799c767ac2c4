//! Response-cache management.

use axum::extract::{Path, State};
use axum::response::Json;

use crate::api::models::StatusResponse;
use crate::api::{resolve_session, ApiError};
use crate::state::AppState;

/// `POST /v1/sessions/{id}/caches` — commit and flush.
pub async fn save_cache(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = resolve_session(&state, &id)?;
    session
        .cache()
        .save()
        .map_err(|e| ApiError::internal("Failed to save cache", e))?;
    Ok(Json(StatusResponse::ok("Cache saved successfully")))
}

/// `DELETE /v1/sessions/{id}/caches` — drop uncommitted entries.
pub async fn discard_cache(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = resolve_session(&state, &id)?;
    session.cache().discard();
    Ok(Json(StatusResponse::ok("Cache discarded successfully")))
}
