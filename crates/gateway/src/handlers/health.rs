//! Health check handlers

use axum::{extract::State, http::header, response::IntoResponse, Json};
use observatory_common::{catalog::CatalogSummary, chatbot::ChatbotStatus};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub catalog: CheckResult,
    pub classifier: CheckResult,
    pub chatbot: ChatbotStatus,
    pub active_sessions: usize,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CatalogSummary>,
}

/// Liveness check, healthy whenever the server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: observatory_common::VERSION.to_string(),
    })
}

/// Readiness check
///
/// The service is ready once researchers are loaded. A missing model only
/// degrades classification to the local fallback.
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let summary = state.catalog.snapshot().await.summary();

    let catalog_check = CheckResult {
        status: if summary.researchers > 0 { "up" } else { "down" }.to_string(),
        detail: (summary.researchers == 0).then(|| "no researchers loaded".to_string()),
        summary: Some(summary),
    };

    let classifier_check = match state.classifier.model_name() {
        Some(model) => CheckResult {
            status: "up".to_string(),
            detail: Some(model.to_string()),
            summary: None,
        },
        None => CheckResult {
            status: "degraded".to_string(),
            detail: Some("local fallback only".to_string()),
            summary: None,
        },
    };

    let ready = catalog_check.status == "up";

    Json(ReadyResponse {
        status: if ready { "ready" } else { "not_ready" }.to_string(),
        checks: HealthChecks {
            catalog: catalog_check,
            classifier: classifier_check,
            chatbot: state.chatbot.status(),
            active_sessions: state.sessions.len().await,
        },
    })
}

/// Prometheus scrape endpoint
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
