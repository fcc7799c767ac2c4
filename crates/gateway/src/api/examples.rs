//! Planner example management.

use axum::extract::{Path, State};
use axum::response::Json;

use nv_domain::example::Example;

use crate::api::models::{AddExampleRequest, StatusResponse};
use crate::api::{resolve_session, ApiError};
use crate::state::AppState;

/// `POST /v1/sessions/{id}/examples`
pub async fn add_example(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddExampleRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = resolve_session(&state, &id)?;
    session.add_example(Example {
        goal: req.goal,
        actions: req.actions,
    });
    Ok(Json(StatusResponse::ok("Example added successfully")))
}

/// `DELETE /v1/sessions/{id}/examples` — idempotent bulk clear.
pub async fn clear_examples(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = resolve_session(&state, &id)?;
    session.clear_examples();
    Ok(Json(StatusResponse::ok("All examples cleared successfully")))
}
