//! Session management handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use observatory_common::{errors::Result, session::SessionView, SearchSession};
use uuid::Uuid;

use super::lock_session;
use crate::AppState;

/// Create a new session on the current catalog
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionView>)> {
    let catalog = state.catalog.snapshot().await;
    let session = SearchSession::new(catalog, &state.config.search, state.chatbot.is_ready());
    let view = session.view();

    state.sessions.insert(session).await;

    tracing::info!(session_id = %view.id, "Session created");

    Ok((StatusCode::CREATED, Json(view)))
}

/// Get session state
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    let session = lock_session(&state, session_id).await?;
    Ok(Json(session.view()))
}

/// Drop a session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.sessions.remove(session_id).await?;
    tracing::info!(session_id = %session_id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}
