//! Researcher profile handlers

use axum::{
    extract::{Path, State},
    Json,
};
use observatory_common::{
    catalog::ResearcherProfile,
    errors::{AppError, Result},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{lock_session, search::validate};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SelectProfileRequest {
    #[validate(length(min = 1, max = 64))]
    pub researcher_id: String,
}

/// Select the profile shown by the session
pub async fn select_profile(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectProfileRequest>,
) -> Result<Json<ResearcherProfile>> {
    validate(&request)?;

    let mut session = lock_session(&state, session_id).await?;
    let profile = session.select_researcher(&request.researcher_id)?;

    tracing::info!(
        session_id = %session_id,
        researcher_id = profile.researcher.id,
        "Profile selected"
    );

    Ok(Json(profile))
}

/// Currently selected profile
pub async fn get_selected_profile(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ResearcherProfile>> {
    let session = lock_session(&state, session_id).await?;
    session
        .selected_profile()
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            resource_type: "profile".to_string(),
            id: session_id.to_string(),
        })
}

/// Stateless profile lookup by researcher id
pub async fn get_researcher(
    State(state): State<AppState>,
    Path(researcher_id): Path<String>,
) -> Result<Json<ResearcherProfile>> {
    let catalog = state.catalog.snapshot().await;
    catalog
        .profile(&researcher_id)
        .map(Json)
        .ok_or(AppError::ResearcherNotFound { id: researcher_id })
}
