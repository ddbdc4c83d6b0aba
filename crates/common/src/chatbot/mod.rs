//! Question answering over the observatory's PDF documents

pub mod pdf;

pub use pdf::PdfDocument;

use crate::errors::Result;
use crate::llm::LanguageModel;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Upper bound on document text sent with every question
pub const MAX_CONTEXT_CHARS: usize = 50_000;

/// A truncated block is only kept when at least this much room remains
const MIN_TRUNCATED_CHARS: usize = 100;

pub const WELCOME_MESSAGE: &str = "¡Hola! Soy tu asistente para consultas sobre documentos del Observatorio. Puedo responder preguntas basándome únicamente en los documentos PDF disponibles. ¿En qué puedo ayudarte?";

pub const UNAVAILABLE_MESSAGE: &str =
    "El chatbot no está disponible. Verifique ANTHROPIC_API_KEY y documentos PDF.";

pub const EMPTY_QUESTION_MESSAGE: &str =
    "Por favor, haz una pregunta específica sobre los documentos del observatorio.";

/// Readiness snapshot for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ChatbotStatus {
    pub ready: bool,
    pub documents_loaded: usize,
    pub available_documents: Vec<String>,
    pub model: Option<String>,
}

/// Document chatbot
pub struct DocumentChatbot {
    model: Option<Arc<dyn LanguageModel>>,
    documents: Vec<PdfDocument>,
    system_prompt: String,
}

impl DocumentChatbot {
    pub fn new(model: Option<Arc<dyn LanguageModel>>, documents: Vec<PdfDocument>) -> Self {
        let system_prompt = system_prompt(&build_context(&documents));
        let chatbot = Self {
            model,
            documents,
            system_prompt,
        };

        if chatbot.is_ready() {
            info!(documents = chatbot.documents.len(), "Document chatbot ready");
        } else {
            info!(
                model = chatbot.model.is_some(),
                documents = chatbot.documents.len(),
                "Document chatbot unavailable"
            );
        }
        chatbot
    }

    /// Load documents from `dir`; blocking, call from a blocking context
    pub fn from_directory(model: Option<Arc<dyn LanguageModel>>, dir: &Path) -> Self {
        Self::new(model, pdf::load_directory(dir))
    }

    /// Ready iff a model is configured and at least one document loaded
    pub fn is_ready(&self) -> bool {
        self.model.is_some() && !self.documents.is_empty()
    }

    pub fn status(&self) -> ChatbotStatus {
        ChatbotStatus {
            ready: self.is_ready(),
            documents_loaded: self.documents.len(),
            available_documents: self.documents.iter().map(|d| d.name.clone()).collect(),
            model: self.model.as_ref().map(|m| m.model_name().to_string()),
        }
    }

    /// Answer a question from the documents.
    ///
    /// Unavailability and blank questions produce guidance text; only model
    /// failures are errors.
    pub async fn ask(&self, question: &str) -> Result<String> {
        let model = match &self.model {
            Some(model) if self.is_ready() => model,
            _ => return Ok(UNAVAILABLE_MESSAGE.to_string()),
        };

        let question = question.trim();
        if question.is_empty() {
            return Ok(EMPTY_QUESTION_MESSAGE.to_string());
        }

        let result = model.complete(&self.system_prompt, question).await;
        crate::metrics::record_chatbot_question(result.is_ok());

        result.map_err(|e| {
            error!(error = %e, "Chatbot question failed");
            e
        })
    }
}

/// Concatenate documents into `=== DOCUMENTO ===` blocks within the cap
pub fn build_context(documents: &[PdfDocument]) -> String {
    let mut context = String::new();
    let mut total = 0usize;

    for document in documents {
        let block = format!("\n\n=== DOCUMENTO ===\n{}\n", document.content);
        let block_len = block.chars().count();

        if total + block_len > MAX_CONTEXT_CHARS {
            let remaining = MAX_CONTEXT_CHARS - total;
            if remaining > MIN_TRUNCATED_CHARS {
                context.extend(block.chars().take(remaining));
                context.push_str("...\n[DOCUMENTO TRUNCADO]");
            }
            break;
        }

        context.push_str(&block);
        total += block_len;
    }

    context
}

fn system_prompt(context: &str) -> String {
    format!(
        "Eres un asistente especializado en el Observatorio de Género en Ciencia.\n\n\
         CONTEXTO DE DOCUMENTOS:\n{context}\n\n\
         REGLAS IMPORTANTES:\n\
         1. Solo responde con información que esté explícitamente en los documentos proporcionados\n\
         2. Si no encuentras la información en los documentos, di claramente que no tienes esa información\n\
         3. Responde siempre en español\n\
         4. Sé conciso pero completo\n\
         5. Cita el documento específico cuando sea relevante\n\
         6. No inventes información que no esté en los documentos"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::llm::MockModel;

    fn document(name: &str, content: &str) -> PdfDocument {
        PdfDocument {
            name: name.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_context_blocks() {
        let context = build_context(&[document("a.pdf", "uno"), document("b.pdf", "dos")]);
        assert_eq!(context, "\n\n=== DOCUMENTO ===\nuno\n\n\n=== DOCUMENTO ===\ndos\n");
    }

    #[test]
    fn test_context_truncates_crossing_block() {
        let big = "x".repeat(MAX_CONTEXT_CHARS);
        let context = build_context(&[document("a.pdf", "corto"), document("b.pdf", &big)]);

        assert!(context.ends_with("...\n[DOCUMENTO TRUNCADO]"));
        let body = context.trim_end_matches("...\n[DOCUMENTO TRUNCADO]");
        assert_eq!(body.chars().count(), MAX_CONTEXT_CHARS);
    }

    #[test]
    fn test_context_drops_block_when_little_room_left() {
        let first = "x".repeat(MAX_CONTEXT_CHARS - 100);
        let second = "y".repeat(200);
        let context = build_context(&[document("a.pdf", &first), document("b.pdf", &second)]);

        assert!(!context.contains("TRUNCADO"));
        assert!(!context.contains('y'));
    }

    #[tokio::test]
    async fn test_not_ready_without_documents() {
        let chatbot = DocumentChatbot::new(Some(Arc::new(MockModel::new())), vec![]);
        assert!(!chatbot.is_ready());
        assert_eq!(chatbot.ask("¿qué es?").await.unwrap(), UNAVAILABLE_MESSAGE);
    }

    #[tokio::test]
    async fn test_not_ready_without_model() {
        let chatbot = DocumentChatbot::new(None, vec![document("a.pdf", "uno")]);
        assert!(!chatbot.status().ready);
        assert_eq!(chatbot.ask("hola").await.unwrap(), UNAVAILABLE_MESSAGE);
    }

    #[tokio::test]
    async fn test_ask_forwards_question_with_context() {
        let model = Arc::new(MockModel::with_replies(["El observatorio mide brechas."]));
        let chatbot = DocumentChatbot::new(
            Some(model.clone() as Arc<dyn LanguageModel>),
            vec![document("informe.pdf", "brechas de genero")],
        );

        assert_eq!(chatbot.ask("   ").await.unwrap(), EMPTY_QUESTION_MESSAGE);
        let answer = chatbot.ask(" ¿Qué mide? ").await.unwrap();
        assert_eq!(answer, "El observatorio mide brechas.");

        let prompts = model.prompts().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].0.contains("brechas de genero"));
        assert_eq!(prompts[0].1, "¿Qué mide?");
    }

    #[tokio::test]
    async fn test_model_error_is_surfaced() {
        let model = MockModel::new();
        model.push_error(AppError::ModelTimeout { timeout_ms: 5 }).await;
        let chatbot = DocumentChatbot::new(Some(Arc::new(model)), vec![document("a.pdf", "x")]);

        assert!(chatbot.ask("pregunta").await.is_err());
    }
}
