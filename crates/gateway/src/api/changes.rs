//! `POST /v1/sessions/{id}/changes` — describe what changed between two
//! screen snapshots.

use axum::extract::{Path, State};
use axum::response::Json;

use nv_a11y::diff;

use crate::api::models::{self, ChangesRequest, ChangesResponse};
use crate::api::{resolve_session, ApiError};
use crate::state::AppState;

pub async fn analyze_changes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChangesRequest>,
) -> Result<Json<ChangesResponse>, ApiError> {
    let session = resolve_session(&state, &id)?;
    let _guard = session.lock_pipeline().await;

    let before = session
        .process_tree(&req.before.accessibility_tree)
        .map_err(|e| ApiError::internal("Failed to analyze change", e))?;
    let after = session
        .process_tree(&req.after.accessibility_tree)
        .map_err(|e| ApiError::internal("Failed to analyze change", e))?;

    // Ids are stripped so renumbering between snapshots is invisible.
    let tree_diff = diff::compute(&before.to_xml_without_ids(), &after.to_xml_without_ids());

    let mut analysis = String::new();
    if !req.before.url.is_empty() && !req.after.url.is_empty() {
        if req.before.url != req.after.url {
            analysis = format!("URL changed to {}. ", req.after.url);
        } else {
            analysis = "URL did not change. ".into();
        }
    }

    let summary = session
        .changes_analyzer
        .invoke(&tree_diff)
        .await
        .map_err(|e| ApiError::internal("Failed to analyze change", e))?;
    analysis.push_str(&summary);

    Ok(Json(ChangesResponse {
        api_version: models::v1(),
        result: analysis,
    }))
}
