//! Session lifecycle endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use nv_domain::model::{Model, Provider};
use nv_domain::tool::parse_tool_schemas;
use nv_sessions::SessionConfig;

use crate::api::models::{self, SessionRequest, SessionResponse, StatsResponse};
use crate::api::{resolve_session, ApiError};
use crate::state::AppState;

/// `POST /v1/sessions`
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let provider: Provider = req
        .provider
        .parse()
        .map_err(|_| ApiError::unprocessable(format!("unknown provider: {}", req.provider)))?;
    let tools = parse_tool_schemas(&req.tools)
        .map_err(|e| ApiError::unprocessable(e.to_string()))?;

    let model = Model::new(provider, req.name);
    tracing::info!(
        model = %model.label(),
        platform = %req.platform,
        planner = req.planner,
        "creating session"
    );

    let session_id = state
        .sessions
        .create(SessionConfig {
            model,
            platform: req.platform,
            tools,
            planner: req.planner,
            cache_dir: state.config.cache_dir.clone(),
            prompt_dir: state.config.prompt_dir.clone(),
            provider: state.provider_override.clone(),
        })
        .map_err(|e| ApiError::internal("Failed to create session", e))?;

    Ok(Json(SessionResponse {
        api_version: models::v1(),
        session_id,
    }))
}

/// `GET /v1/sessions`
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.sessions.list())
}

/// `DELETE /v1/sessions/{id}`
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.delete(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found())
    }
}

/// `GET /v1/sessions/{id}/stats`
pub async fn session_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatsResponse>, ApiError> {
    let session = resolve_session(&state, &id)?;
    let stats = session.stats();
    Ok(Json(StatsResponse {
        api_version: models::v1(),
        total: stats.total,
        cache: stats.cache,
    }))
}
