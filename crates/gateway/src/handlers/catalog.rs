//! Catalog handlers

use axum::{extract::State, Json};
use observatory_common::{catalog::CatalogSummary, errors::Result};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct AreasResponse {
    pub total: usize,
    pub areas: Vec<String>,
}

/// Controlled area vocabulary, sorted
pub async fn list_areas(State(state): State<AppState>) -> Json<AreasResponse> {
    let catalog = state.catalog.snapshot().await;
    let areas = catalog.vocabulary().to_vec();

    Json(AreasResponse {
        total: areas.len(),
        areas,
    })
}

/// Reload the CSV sources; the previous generation stays on failure
pub async fn reload(State(state): State<AppState>) -> Result<Json<CatalogSummary>> {
    let catalog = state.catalog.reload().await.map_err(|e| {
        tracing::error!(error = %e, "Catalog reload failed");
        e
    })?;

    let summary = catalog.summary();
    tracing::info!(
        researchers = summary.researchers,
        projects = summary.projects,
        publications = summary.publications,
        "Catalog reloaded"
    );

    Ok(Json(summary))
}
