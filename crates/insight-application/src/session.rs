//! Per-user analysis sessions.

use crate::result_cache::{FailurePolicy, ResultCache};
use chrono::{DateTime, Utc};
use insight_core::section::SectionStates;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// State owned by one user session: section records and memoized results.
///
/// Nothing in here is shared with other sessions.
pub struct AnalysisSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub sections: SectionStates,
    pub cache: ResultCache,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::with_failure_policy(FailurePolicy::default())
    }

    pub fn with_failure_policy(failure_policy: FailurePolicy) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            sections: SectionStates::new(),
            cache: ResultCache::with_failure_policy(failure_policy),
        }
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Live sessions keyed by id.
///
/// A session is created by [`open`](Self::open) and torn down by
/// [`close`](Self::close); its cache goes with it.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<AnalysisSession>>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new session and returns its handle.
    pub async fn open(&self) -> (Uuid, Arc<Mutex<AnalysisSession>>) {
        let session = AnalysisSession::new();
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, handle.clone());
        tracing::debug!(session_id = %id, "Session opened");
        (id, handle)
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<Mutex<AnalysisSession>>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drops the session. Returns false if it was not open.
    pub async fn close(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::debug!(session_id = %id, "Session closed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
