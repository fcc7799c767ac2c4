//! `POST /v1/sessions/{id}/steps` — emit tool calls for one plan step.
//!
//! The Actor references opaque tree ids; they are rewritten to raw driver
//! ids before the response leaves the server.

use axum::extract::{Path, State};
use axum::response::Json;

use crate::api::models::{self, StepRequest, StepResponse};
use crate::api::{resolve_session, ApiError};
use crate::state::AppState;

pub async fn plan_step_actions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StepRequest>,
) -> Result<Json<StepResponse>, ApiError> {
    let session = resolve_session(&state, &id)?;
    let _guard = session.lock_pipeline().await;

    let tree = session
        .process_tree(&req.accessibility_tree)
        .map_err(|e| ApiError::internal("Failed to execute actions", e))?;
    let (explanation, actions) = session
        .actor
        .invoke(&req.goal, &req.step, &tree.to_xml())
        .await
        .map_err(|e| ApiError::internal("Failed to execute actions", e))?;
    let actions = tree
        .map_tool_calls_to_raw_id(&actions)
        .map_err(|e| ApiError::internal("Failed to execute actions", e))?;

    Ok(Json(StepResponse {
        api_version: models::v1(),
        explanation,
        actions,
    }))
}
