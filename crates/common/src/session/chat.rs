//! Chat history kept per session

use crate::chatbot::WELCOME_MESSAGE;
use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const INIT_ERROR_MESSAGE: &str =
    "No se pudo inicializar el chatbot. Verifique ANTHROPIC_API_KEY y documentos PDF.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            sent_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    Ready,
    Unavailable,
}

/// Question accepted by [`ChatHistory::begin`] awaiting an answer
#[derive(Debug, Clone)]
pub struct PendingQuestion {
    pub question: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatHistory {
    status: ChatStatus,
    messages: Vec<ChatMessage>,
    loading: bool,
    error: Option<String>,
}

impl ChatHistory {
    /// Seeded with the welcome message when the chatbot is ready
    pub fn new(ready: bool) -> Self {
        if ready {
            Self {
                status: ChatStatus::Ready,
                messages: vec![ChatMessage::new(ChatRole::Assistant, WELCOME_MESSAGE)],
                loading: false,
                error: None,
            }
        } else {
            Self {
                status: ChatStatus::Unavailable,
                messages: Vec::new(),
                loading: false,
                error: Some(INIT_ERROR_MESSAGE.to_string()),
            }
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record the user's message; blank input is ignored
    pub fn begin(&mut self, input: &str) -> Result<Option<PendingQuestion>> {
        let question = input.trim();
        if question.is_empty() {
            return Ok(None);
        }
        if self.loading {
            return Err(AppError::ChatInProgress);
        }

        self.loading = true;
        self.error = None;
        self.messages.push(ChatMessage::new(ChatRole::User, question));

        Ok(Some(PendingQuestion {
            question: question.to_string(),
        }))
    }

    /// Append the answer, or drop the pending user message on failure
    pub fn finish(&mut self, answer: Result<String>) {
        match answer {
            Ok(text) => self.messages.push(ChatMessage::new(ChatRole::Assistant, text)),
            Err(e) => {
                self.error = Some(format!("Error: {}", e));
                if self
                    .messages
                    .last()
                    .is_some_and(|m| m.role == ChatRole::User)
                {
                    self.messages.pop();
                }
            }
        }
        self.loading = false;
    }
}
