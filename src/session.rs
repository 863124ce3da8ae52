//! Session store: engine session id → latest session state.
//!
//! Written only as a side effect of a successful engine call made by the
//! dispatcher. Entries are overwritten, never merged, and never evicted here;
//! two invocations racing on one session id resolve last-write-wins.

use crate::engine::SessionState;
use crate::types::SessionId;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Latest known state of one driver session.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub session_id: SessionId,
    pub state: SessionState,
    pub updated_at: DateTime<Utc>,
}

/// Concurrent session map shared by all invocations of one bridge.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `state` under `session_id`, replacing any previous entry.
    /// Returns false (and stores nothing) for an empty id.
    pub(crate) fn record(&self, session_id: &str, state: SessionState) -> bool {
        let Ok(id) = SessionId::from_string(session_id.to_string()) else {
            tracing::warn!("Engine returned a session without an id; not recorded");
            return false;
        };
        let replaced = self
            .sessions
            .insert(
                session_id.to_string(),
                SessionEntry {
                    session_id: id,
                    state,
                    updated_at: Utc::now(),
                },
            )
            .is_some();
        tracing::debug!(session_id, replaced, "Recorded engine session");
        true
    }

    pub fn get(&self, session_id: &str) -> Option<SessionEntry> {
        self.sessions.get(session_id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Known session ids, sorted.
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
