//! In-memory session registry.
//!
//! Owns every [`Session`] behind a read-write lock. Reads (resolution,
//! listing) take the shared lock; creation and deletion take the exclusive
//! lock. Handlers hold an `Arc` to the resolved session, so deleting a
//! session never tears state out from under an in-flight request.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use nv_domain::error::Result;

use crate::session::{Session, SessionConfig, SessionStats};

#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session and return its id.
    pub fn create(&self, config: SessionConfig) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(id.clone(), config)?);
        self.sessions.write().insert(id.clone(), session);
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session. Returns false when the id is unknown.
    pub fn delete(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "deleted session");
        }
        removed
    }

    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Combined token statistics over all live sessions.
    pub fn total_stats(&self) -> SessionStats {
        let mut stats = SessionStats::default();
        for session in self.sessions.read().values() {
            stats.add(&session.stats());
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nv_a11y::Platform;
    use nv_domain::model::{Model, Provider};
    use nv_providers::testing::MockProvider;

    fn config() -> SessionConfig {
        SessionConfig {
            model: Model::new(Provider::Anthropic, None),
            platform: Platform::Chromium,
            tools: Vec::new(),
            planner: true,
            cache_dir: None,
            prompt_dir: None,
            provider: Some(Arc::new(MockProvider::new())),
        }
    }

    #[test]
    fn created_sessions_are_listed_until_deleted() {
        let manager = SessionManager::new();
        let id = manager.create(config()).unwrap();
        assert!(manager.list().contains(&id));
        assert!(manager.get(&id).is_some());

        assert!(manager.delete(&id));
        assert!(!manager.list().contains(&id));
        assert!(manager.get(&id).is_none());
        assert!(!manager.delete(&id));
    }

    #[test]
    fn ids_are_unique() {
        let manager = SessionManager::new();
        let a = manager.create(config()).unwrap();
        let b = manager.create(config()).unwrap();
        assert_ne!(a, b);
        assert_eq!(manager.list().len(), 2);
    }

    #[test]
    fn deleted_session_stays_usable_by_holders() {
        let manager = SessionManager::new();
        let id = manager.create(config()).unwrap();
        let held = manager.get(&id).unwrap();
        manager.delete(&id);
        // The in-flight holder still sees a consistent session.
        assert_eq!(held.id(), id);
        assert!(held.stats().total.is_zero());
    }

    #[test]
    fn total_stats_aggregates_sessions() {
        let manager = SessionManager::new();
        manager.create(config()).unwrap();
        manager.create(config()).unwrap();
        let stats = manager.total_stats();
        assert!(stats.total.is_zero());
        assert!(stats.cache.is_zero());
    }
}
