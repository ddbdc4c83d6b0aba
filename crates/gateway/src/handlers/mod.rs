//! API handlers module

pub mod areas;
pub mod catalog;
pub mod chat;
pub mod health;
pub mod profiles;
pub mod search;
pub mod sessions;
pub mod tables;

use crate::AppState;
use observatory_common::{errors::Result, SearchSession};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

/// Lock a session and move it onto the current catalog generation
pub(crate) async fn lock_session(
    state: &AppState,
    id: Uuid,
) -> Result<OwnedMutexGuard<SearchSession>> {
    let handle = state.sessions.get(id).await?;
    let catalog = state.catalog.snapshot().await;

    let mut session = handle.lock_owned().await;
    session.refresh_catalog(catalog);
    session.touch();
    Ok(session)
}
