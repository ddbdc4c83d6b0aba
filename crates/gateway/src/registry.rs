//! In-memory session registry
//!
//! Each session sits behind its own mutex; the map lock is only held long
//! enough to look a session up.

use chrono::Utc;
use observatory_common::{
    errors::{AppError, Result},
    metrics, SearchSession,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub type SessionHandle = Arc<Mutex<SearchSession>>;

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn insert(&self, session: SearchSession) -> SessionHandle {
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, handle.clone());
        metrics::record_active_sessions(sessions.len());
        debug!(session_id = %id, "Session registered");
        handle
    }

    pub async fn get(&self, id: Uuid) -> Result<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::SessionNotFound { id: id.to_string() })
    }

    pub async fn remove(&self, id: Uuid) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions
            .remove(&id)
            .ok_or_else(|| AppError::SessionNotFound { id: id.to_string() })?;
        metrics::record_active_sessions(sessions.len());
        debug!(session_id = %id, "Session removed");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for longer than the TTL; returns how many went
    pub async fn purge_expired(&self) -> usize {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now() - ttl;

        let handles: Vec<(Uuid, SessionHandle)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, handle)| (*id, handle.clone()))
            .collect();

        let mut expired = Vec::new();
        for (id, handle) in handles {
            // busy sessions are in use, not idle
            if let Ok(session) = handle.try_lock() {
                if session.last_active() < cutoff {
                    expired.push(id);
                }
            }
        }

        if !expired.is_empty() {
            let mut sessions = self.sessions.write().await;
            for id in &expired {
                sessions.remove(id);
            }
            metrics::record_active_sessions(sessions.len());
            info!(expired = expired.len(), remaining = sessions.len(), "Expired sessions purged");
        }

        expired.len()
    }

    /// Periodically purge idle sessions until the runtime shuts down
    pub fn spawn_cleanup(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                registry.purge_expired().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use observatory_common::{config::SearchConfig, Catalog};

    fn session() -> SearchSession {
        SearchSession::new(Arc::new(Catalog::empty()), &SearchConfig::default(), false)
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let handle = registry.insert(session()).await;
        let id = handle.lock().await.id();

        assert!(registry.get(id).await.is_ok());
        registry.remove(id).await.unwrap();
        assert!(matches!(
            registry.get(id).await,
            Err(AppError::SessionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let registry = SessionRegistry::new(Duration::ZERO);
        registry.insert(session()).await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(registry.purge_expired().await, 1);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_active_sessions_survive() {
        let registry = SessionRegistry::new(Duration::from_secs(3600));
        registry.insert(session()).await;

        assert_eq!(registry.purge_expired().await, 0);
        assert_eq!(registry.len().await, 1);
    }
}
