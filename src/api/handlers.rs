//! HTTP request handlers

use super::types::{DriversResponse, ErrorResponse, EventResponse, SessionResponse};
use super::AppState;
use crate::runtime::RuntimeError;
use crate::state_machine::{ConversationId, Event};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session snapshot
        .route("/api/conversations/:id", get(get_conversation))
        // Event delivery
        .route("/api/conversations/:id/events", post(send_event))
        // Available drivers for the conversation's registry
        .route("/api/conversations/:id/drivers", get(list_drivers))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Conversations
// ============================================================

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.runtime.session(id).await?;
    Ok(Json(session.into()))
}

async fn send_event(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
    Json(event): Json<Event>,
) -> Result<Json<EventResponse>, AppError> {
    tracing::debug!(conversation_id = id, event = event.kind(), "Received event");
    let outcome = state.runtime.send_event(id, event).await?;
    Ok(Json(outcome.into()))
}

async fn list_drivers(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
) -> Json<DriversResponse> {
    Json(DriversResponse {
        drivers: state.runtime.available_drivers(id),
    })
}

async fn get_version() -> &'static str {
    concat!("carpool ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(err: RuntimeError) -> Self {
        tracing::error!(error = %err, "Request failed");
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
