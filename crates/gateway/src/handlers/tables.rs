//! Paginated table handlers
//!
//! `researchers` is driven by the search term and area filters; `projects`
//! and `publications` list the selected profile's records.

use axum::{
    extract::{Path, State},
    Json,
};
use observatory_common::{
    catalog::{Project, Publication, Researcher},
    errors::Result,
    search::Page,
    session::{PageAction, Table},
    SearchSession,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{lock_session, search::validate};
use crate::AppState;

#[derive(Serialize)]
#[serde(untagged)]
pub enum TablePage {
    Researchers(Page<Researcher>),
    Projects(Page<Project>),
    Publications(Page<Publication>),
}

impl TablePage {
    fn of(session: &SearchSession, table: Table) -> Self {
        match table {
            Table::Researchers => Self::Researchers(session.researchers_page()),
            Table::Projects => Self::Projects(session.projects_page()),
            Table::Publications => Self::Publications(session.publications_page()),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct TableSearchRequest {
    #[validate(length(max = 1000))]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub action: PageAction,
}

/// Current page of a table
pub async fn get_page(
    State(state): State<AppState>,
    Path((session_id, table)): Path<(Uuid, Table)>,
) -> Result<Json<TablePage>> {
    let session = lock_session(&state, session_id).await?;
    Ok(Json(TablePage::of(&session, table)))
}

/// Set a table's free-text filter; the pager goes back to the first page
pub async fn set_search(
    State(state): State<AppState>,
    Path((session_id, table)): Path<(Uuid, Table)>,
    Json(request): Json<TableSearchRequest>,
) -> Result<Json<TablePage>> {
    validate(&request)?;

    let mut session = lock_session(&state, session_id).await?;
    match table {
        Table::Researchers => session.set_search_term(&request.text),
        Table::Projects => session.set_project_search(&request.text),
        Table::Publications => session.set_publication_search(&request.text),
    }

    Ok(Json(TablePage::of(&session, table)))
}

/// Move a table's pager
pub async fn navigate(
    State(state): State<AppState>,
    Path((session_id, table)): Path<(Uuid, Table)>,
    Json(request): Json<NavigateRequest>,
) -> Result<Json<TablePage>> {
    let mut session = lock_session(&state, session_id).await?;
    session.navigate(table, request.action);

    tracing::debug!(
        session_id = %session_id,
        table = ?table,
        action = ?request.action,
        "Page navigation"
    );

    Ok(Json(TablePage::of(&session, table)))
}
