//! Area and element lookup endpoints. Both return raw driver ids.

use axum::extract::{Path, State};
use axum::response::Json;

use crate::api::models::{
    self, AreaRequest, AreaResponse, FindRequest, FindResponse, FoundElement,
};
use crate::api::{resolve_session, ApiError};
use crate::state::AppState;

/// `POST /v1/sessions/{id}/areas`
pub async fn choose_area(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AreaRequest>,
) -> Result<Json<AreaResponse>, ApiError> {
    let session = resolve_session(&state, &id)?;
    let _guard = session.lock_pipeline().await;

    let tree = session
        .process_tree(&req.accessibility_tree)
        .map_err(|e| ApiError::internal("Failed to choose accessibility area", e))?;
    let (opaque, explanation) = session
        .area
        .invoke(&req.description, &tree.to_xml())
        .await
        .map_err(|e| ApiError::internal("Failed to choose accessibility area", e))?;
    let raw = tree
        .raw_id(opaque)
        .map_err(|e| ApiError::internal("Failed to choose accessibility area", e))?;

    Ok(Json(AreaResponse {
        api_version: models::v1(),
        id: raw,
        explanation,
    }))
}

/// `POST /v1/sessions/{id}/elements`
pub async fn find_element(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<FindRequest>,
) -> Result<Json<FindResponse>, ApiError> {
    let session = resolve_session(&state, &id)?;
    let _guard = session.lock_pipeline().await;

    let tree = session
        .process_tree(&req.accessibility_tree)
        .map_err(|e| ApiError::internal("Failed to find element", e))?;
    let located = session
        .locator
        .invoke(&req.description, &tree.to_xml())
        .await
        .map_err(|e| ApiError::internal("Failed to find element", e))?;

    let mut elements = Vec::with_capacity(located.len());
    for element in located {
        let raw = tree
            .raw_id(element.id)
            .map_err(|e| ApiError::internal("Failed to find element", e))?;
        elements.push(FoundElement {
            id: raw,
            explanation: element.explanation,
        });
    }

    Ok(Json(FindResponse {
        api_version: models::v1(),
        elements,
    }))
}
