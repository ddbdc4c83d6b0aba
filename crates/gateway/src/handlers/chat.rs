//! Document chatbot handlers

use axum::{
    extract::{Path, State},
    Json,
};
use observatory_common::{
    chatbot::ChatbotStatus,
    errors::{AppError, Result},
    session::ChatHistory,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{lock_session, search::validate};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(max = 4000))]
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub chat: ChatHistory,
}

/// Send a question to the document chatbot
///
/// Model failures are recorded in the session's chat error rather than
/// returned as an HTTP error.
pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    validate(&request)?;

    let pending = {
        let mut session = lock_session(&state, session_id).await?;
        match session.chat_mut().begin(&request.message)? {
            Some(pending) => pending,
            None => {
                return Ok(Json(ChatResponse {
                    chat: session.chat().clone(),
                }))
            }
        }
    };

    let task_state = state.clone();
    let completion = tokio::spawn(async move {
        let answer = task_state.chatbot.ask(&pending.question).await;
        if let Err(e) = &answer {
            tracing::warn!(session_id = %session_id, error = %e, "Chat answer failed");
        }

        let mut session = lock_session(&task_state, session_id).await?;
        session.chat_mut().finish(answer);
        Ok::<_, AppError>(session.chat().clone())
    });

    let chat = completion.await.map_err(|e| AppError::Internal {
        message: format!("Chat task failed: {}", e),
    })??;

    Ok(Json(ChatResponse { chat }))
}

/// Chatbot readiness and loaded documents
pub async fn status(State(state): State<AppState>) -> Json<ChatbotStatus> {
    Json(state.chatbot.status())
}
