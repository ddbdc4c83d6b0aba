//! Area filter handlers

use axum::{
    extract::{Path, State},
    Json,
};
use observatory_common::errors::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{lock_session, search::validate, search::SearchStateResponse};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct AreaRequest {
    #[validate(length(min = 1, max = 200))]
    pub area: String,
}

#[derive(Serialize)]
pub struct AreaChangeResponse {
    /// False when the call left the selection untouched
    pub changed: bool,
    #[serde(flatten)]
    pub state: SearchStateResponse,
}

/// Add an area to the selection; unknown areas are ignored
pub async fn add_area(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AreaRequest>,
) -> Result<Json<AreaChangeResponse>> {
    validate(&request)?;

    let mut session = lock_session(&state, session_id).await?;
    let changed = session.add_area(&request.area);

    Ok(Json(AreaChangeResponse {
        changed,
        state: SearchStateResponse::from_session(&session),
    }))
}

pub async fn remove_area(
    State(state): State<AppState>,
    Path((session_id, area)): Path<(Uuid, String)>,
) -> Result<Json<AreaChangeResponse>> {
    let mut session = lock_session(&state, session_id).await?;
    let changed = session.remove_area(&area);

    Ok(Json(AreaChangeResponse {
        changed,
        state: SearchStateResponse::from_session(&session),
    }))
}

pub async fn clear_areas(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SearchStateResponse>> {
    let mut session = lock_session(&state, session_id).await?;
    session.clear_areas();
    Ok(Json(SearchStateResponse::from_session(&session)))
}

/// Forget classifier-detected areas; the selection itself is kept
pub async fn clear_detected_areas(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SearchStateResponse>> {
    let mut session = lock_session(&state, session_id).await?;
    session.clear_detected_areas();
    Ok(Json(SearchStateResponse::from_session(&session)))
}
