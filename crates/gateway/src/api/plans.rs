//! `POST /v1/sessions/{id}/plans` — plan actions to achieve a goal.

use axum::extract::{Path, State};
use axum::response::Json;

use crate::api::models::{self, PlanRequest, PlanResponse};
use crate::api::{resolve_session, ApiError};
use crate::state::AppState;

pub async fn plan_actions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    let session = resolve_session(&state, &id)?;

    // Planner off: the goal passes through as the single step, with no
    // model involved.
    if !session.planner_enabled() {
        return Ok(Json(PlanResponse {
            api_version: models::v1(),
            explanation: req.goal.clone(),
            steps: vec![req.goal],
        }));
    }

    let _guard = session.lock_pipeline().await;
    let tree = session
        .process_tree(&req.accessibility_tree)
        .map_err(|e| ApiError::internal("Failed to plan actions", e))?;
    let (explanation, steps) = session
        .planner
        .invoke(&req.goal, &tree.to_xml(), &session.examples())
        .await
        .map_err(|e| ApiError::internal("Failed to plan actions", e))?;

    Ok(Json(PlanResponse {
        api_version: models::v1(),
        explanation,
        steps,
    }))
}
