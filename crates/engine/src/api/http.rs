//! HTTP routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use storyloom_domain::{SessionId, SessionState};

use crate::app::App;
use crate::use_cases::{TransitionState, TurnError, TurnOutcome};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/turn", post(run_turn))
}

async fn health() -> &'static str {
    "OK"
}

/// Session state as shown to clients.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub scene: String,
    pub beat: String,
    pub map: String,
    pub available_actions: Vec<String>,
    pub display_history: Vec<String>,
}

impl From<SessionState> for SessionView {
    fn from(state: SessionState) -> Self {
        Self {
            session_id: state.session_id.to_string(),
            scene: state.current_scene.to_string(),
            beat: state.current_beat.to_string(),
            map: state.current_map.to_string(),
            available_actions: state.available_actions,
            display_history: state.display_history,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub input: String,
}

#[derive(Debug, Serialize)]
pub struct TurnView {
    pub narrative: String,
    pub available_actions: Vec<String>,
    /// Set when the story cannot continue, with the reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended: Option<&'static str>,
}

impl From<TurnOutcome> for TurnView {
    fn from(outcome: TurnOutcome) -> Self {
        let ended = match outcome.transition {
            TransitionState::Active => None,
            TransitionState::Terminal(reason) => Some(reason.as_str()),
        };
        Self {
            narrative: outcome.narrative,
            available_actions: outcome.available_actions,
            ended,
        }
    }
}

async fn create_session(State(app): State<Arc<App>>) -> Result<Json<SessionView>, ApiError> {
    let state = app.sessions.create().await?;
    Ok(Json(state.into()))
}

async fn get_session(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let state = app
        .sessions
        .get(&SessionId::from_uuid(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(state.into()))
}

async fn run_turn(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnView>, ApiError> {
    if request.input.trim().is_empty() {
        return Err(ApiError::BadRequest("input must not be empty".into()));
    }
    let outcome = app
        .turns
        .run(&SessionId::from_uuid(id), &request.input)
        .await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Timeout,
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => {
                (axum::http::StatusCode::NOT_FOUND, "Not found").into_response()
            }
            ApiError::BadRequest(msg) => {
                (axum::http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            ApiError::Timeout => (
                axum::http::StatusCode::GATEWAY_TIMEOUT,
                "Turn deadline exceeded",
            )
                .into_response(),
            ApiError::Internal(_) => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error",
            )
                .into_response(),
        }
    }
}

impl From<crate::infrastructure::ports::StoreError> for ApiError {
    fn from(e: crate::infrastructure::ports::StoreError) -> Self {
        if e.is_not_found() {
            ApiError::NotFound
        } else {
            ApiError::Internal(e.to_string())
        }
    }
}

impl From<TurnError> for ApiError {
    fn from(e: TurnError) -> Self {
        match e {
            TurnError::NotFound(_) => ApiError::NotFound,
            TurnError::Timeout(_) => ApiError::Timeout,
            TurnError::Store(e) => e.into(),
        }
    }
}
