//! Intent classifier
//!
//! Sends the query to the language model and parses its JSON reply. Every
//! failure path resolves to the local keyword fallback, so `classify`
//! itself never fails.

use super::fallback;
use super::intent::{parse_reply, Intent};
use super::prompt;
use crate::catalog::Catalog;
use crate::config::SearchConfig;
use crate::errors::{AppError, Result};
use crate::llm::LanguageModel;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Where a classification came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Model,
    Fallback,
}

impl ClassificationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationSource::Model => "model",
            ClassificationSource::Fallback => "fallback",
        }
    }
}

/// Classifier output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub intent: Intent,
    pub source: ClassificationSource,
}

/// Maps free text onto an [`Intent`]
#[derive(Clone)]
pub struct IntentClassifier {
    model: Option<Arc<dyn LanguageModel>>,
    config: SearchConfig,
}

impl IntentClassifier {
    /// Create a classifier; without a model every query uses the fallback
    pub fn new(model: Option<Arc<dyn LanguageModel>>, config: SearchConfig) -> Self {
        if model.is_none() {
            warn!("No language model configured, intent classification uses local fallback");
        }
        Self { model, config }
    }

    /// Classifier that never calls out
    pub fn fallback_only(config: SearchConfig) -> Self {
        Self {
            model: None,
            config,
        }
    }

    pub fn is_model_backed(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_ref().map(|m| m.model_name())
    }

    /// Classify a non-empty query against the given catalog generation
    pub async fn classify(&self, query: &str, catalog: &Catalog) -> Classification {
        let start = Instant::now();

        let classification = match self.classify_with_model(query, catalog).await {
            Ok(intent) => Classification {
                intent,
                source: ClassificationSource::Model,
            },
            Err(e) => {
                if self.model.is_some() {
                    warn!(
                        query,
                        error = %e,
                        code = e.code().as_code(),
                        "Model classification failed, using fallback"
                    );
                    crate::metrics::record_classifier_failure(failure_reason(&e));
                }
                Classification {
                    intent: fallback::classify(query, catalog.vocabulary()),
                    source: ClassificationSource::Fallback,
                }
            }
        };

        let elapsed = start.elapsed();
        crate::metrics::record_classification(
            elapsed.as_secs_f64(),
            classification.source.as_str(),
            classification.intent.kind(),
        );

        info!(
            query,
            intent = classification.intent.kind(),
            source = classification.source.as_str(),
            areas = classification.intent.areas().len(),
            latency_ms = elapsed.as_millis() as u64,
            "Query classified"
        );

        classification
    }

    async fn classify_with_model(&self, query: &str, catalog: &Catalog) -> Result<Intent> {
        let model = self.model.as_ref().ok_or(AppError::ModelUnavailable)?;

        let system = prompt::system_prompt(catalog, &self.config);
        let reply = model.complete(&system, query).await?;
        debug!(reply_len = reply.len(), "Model reply received");

        parse_reply(&reply, catalog.vocabulary())
    }
}

fn failure_reason(error: &AppError) -> &'static str {
    match error {
        AppError::ModelTimeout { .. } => "timeout",
        AppError::MalformedModelReply { .. } => "malformed_reply",
        AppError::ModelUnavailable => "unavailable",
        e if e.is_classifier_failure() => "transport",
        _ => "other",
    }
}
