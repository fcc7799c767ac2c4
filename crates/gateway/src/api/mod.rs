//! Route table, error envelope, and per-route timeouts.

pub mod caches;
pub mod changes;
pub mod examples;
pub mod health;
pub mod locators;
pub mod models;
pub mod plans;
pub mod sessions;
pub mod statements;
pub mod steps;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use nv_domain::Error;
use nv_sessions::Session;

use crate::state::AppState;

/// Standard error envelope: `{error, detail?}` with the API version.
pub struct ApiError {
    status: StatusCode,
    error: String,
    detail: Option<String>,
}

impl ApiError {
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: "Session not found".into(),
            detail: None,
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            error: message.into(),
            detail: None,
        }
    }

    /// Downstream failure mapped to 500 with the cause in `detail`.
    pub fn internal(context: &str, err: Error) -> Self {
        tracing::error!(error = %err, "{context}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: context.to_string(),
            detail: Some(err.to_string()),
        }
    }

    fn timed_out() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Request timed out".into(),
            detail: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "api_version": "v1",
            "error": self.error,
            "detail": self.detail,
        });
        (self.status, Json(body)).into_response()
    }
}

/// Resolve a session id or produce the 404 envelope.
pub(crate) fn resolve_session(state: &AppState, id: &str) -> Result<Arc<Session>, ApiError> {
    state.sessions.get(id).ok_or_else(ApiError::not_found)
}

// ── Per-route timeouts ─────────────────────────────────────────────

const LONG_TIMEOUT: Duration = Duration::from_secs(120);
const MEDIUM_TIMEOUT: Duration = Duration::from_secs(60);
const SHORT_TIMEOUT: Duration = Duration::from_secs(30);

async fn run_with_timeout(limit: Duration, req: Request, next: Next) -> Response {
    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(response) => response,
        Err(_) => ApiError::timed_out().into_response(),
    }
}

async fn long_timeout(req: Request, next: Next) -> Response {
    run_with_timeout(LONG_TIMEOUT, req, next).await
}

async fn medium_timeout(req: Request, next: Next) -> Response {
    run_with_timeout(MEDIUM_TIMEOUT, req, next).await
}

async fn short_timeout(req: Request, next: Next) -> Response {
    run_with_timeout(SHORT_TIMEOUT, req, next).await
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    // Planning, acting and retrieval drive full agent pipelines.
    let long = Router::new()
        .route("/v1/sessions/:id/plans", post(plans::plan_actions))
        .route("/v1/sessions/:id/steps", post(steps::plan_step_actions))
        .route("/v1/sessions/:id/statements", post(statements::execute_statement))
        .route("/v1/sessions/:id/changes", post(changes::analyze_changes))
        .layer(middleware::from_fn(long_timeout));

    let medium = Router::new()
        .route("/v1/sessions/:id/areas", post(locators::choose_area))
        .route("/v1/sessions/:id/elements", post(locators::find_element))
        .layer(middleware::from_fn(medium_timeout));

    let short = Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/v1/sessions",
            post(sessions::create_session).get(sessions::list_sessions),
        )
        .route("/v1/sessions/:id", delete(sessions::delete_session))
        .route("/v1/sessions/:id/stats", get(sessions::session_stats))
        .route(
            "/v1/sessions/:id/examples",
            post(examples::add_example).delete(examples::clear_examples),
        )
        .route(
            "/v1/sessions/:id/caches",
            post(caches::save_cache).delete(caches::discard_cache),
        )
        .layer(middleware::from_fn(short_timeout));

    Router::new()
        .merge(long)
        .merge(medium)
        .merge(short)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
