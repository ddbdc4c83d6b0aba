//! Search box handlers
//!
//! The session lock is released while the classifier runs so other
//! requests on the same session are not blocked behind the model call.
//! The second half always runs to completion, even if the client goes away.

use axum::{
    extract::{Path, State},
    Json,
};
use observatory_common::{
    catalog::Researcher,
    errors::{AppError, Result},
    search::Page,
    session::SessionView,
    SearchSession,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;
use validator::Validate;

use super::lock_session;
use crate::AppState;

/// Raw search box contents
#[derive(Debug, Deserialize, Validate)]
pub struct SearchInputRequest {
    #[validate(length(max = 1000))]
    pub text: String,
}

/// Submit request; `query` replaces the search box contents when present
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SubmitSearchRequest {
    #[validate(length(max = 1000))]
    pub query: Option<String>,
}

/// Session state plus the first page of matching researchers
#[derive(Serialize)]
pub struct SearchStateResponse {
    pub session: SessionView,
    pub researchers: Page<Researcher>,
}

impl SearchStateResponse {
    pub fn from_session(session: &SearchSession) -> Self {
        Self {
            session: session.view(),
            researchers: session.researchers_page(),
        }
    }
}

#[derive(Serialize)]
pub struct SubmitSearchResponse {
    #[serde(flatten)]
    pub state: SearchStateResponse,
    pub processing_time_ms: u64,
}

pub(crate) fn validate<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })
}

/// Update the search box without submitting
pub async fn set_input(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SearchInputRequest>,
) -> Result<Json<SessionView>> {
    validate(&request)?;

    let mut session = lock_session(&state, session_id).await?;
    session.set_search_input(&request.text);
    Ok(Json(session.view()))
}

/// Classify the current query and merge the result into the filters
pub async fn submit(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SubmitSearchRequest>,
) -> Result<Json<SubmitSearchResponse>> {
    validate(&request)?;
    let start = Instant::now();

    let pending = {
        let mut session = lock_session(&state, session_id).await?;
        if let Some(query) = &request.query {
            session.set_search_input(query);
        }
        session.begin_search()?
    };

    tracing::info!(session_id = %session_id, query = %pending.query, "Search submitted");

    // Finish in a task of its own so a dropped request cannot leave the
    // session loading
    let task_state = state.clone();
    let completion = tokio::spawn(async move {
        let classification = task_state
            .classifier
            .classify(&pending.query, &pending.catalog)
            .await;

        let mut session = lock_session(&task_state, session_id).await?;
        session.finish_search(&pending, classification);
        Ok::<_, AppError>(SearchStateResponse::from_session(&session))
    });

    let search_state = completion.await.map_err(|e| AppError::Internal {
        message: format!("Search task failed: {}", e),
    })??;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        session_id = %session_id,
        latency_ms = processing_time_ms,
        "Search completed"
    );

    Ok(Json(SubmitSearchResponse {
        state: search_state,
        processing_time_ms,
    }))
}
