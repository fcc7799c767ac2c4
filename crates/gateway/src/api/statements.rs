//! `POST /v1/sessions/{id}/statements` — retrieve information or verify a
//! statement against the current screen.

use axum::extract::{Path, State};
use axum::response::Json;

use crate::api::models::{self, StatementRequest, StatementResponse};
use crate::api::{resolve_session, ApiError};
use crate::state::AppState;

pub async fn execute_statement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatementRequest>,
) -> Result<Json<StatementResponse>, ApiError> {
    let session = resolve_session(&state, &id)?;
    let _guard = session.lock_pipeline().await;

    let tree = session
        .process_tree(&req.accessibility_tree)
        .map_err(|e| ApiError::internal("Failed to verify statement", e))?;
    let (explanation, result) = session
        .retriever
        .invoke(
            &req.statement,
            &tree.to_xml(),
            req.title.as_deref().unwrap_or_default(),
            req.url.as_deref().unwrap_or_default(),
            req.screenshot.as_deref(),
        )
        .await
        .map_err(|e| ApiError::internal("Failed to verify statement", e))?;

    Ok(Json(StatementResponse {
        api_version: models::v1(),
        result,
        explanation,
    }))
}
