//! Per-session conversation state.
//!
//! The reference behavior ("remember the last-resolved employee") is keyed
//! by session id here so concurrent sessions cannot corrupt each other's
//! pronoun resolution. The router receives a mutable snapshot and the
//! engine commits it back after routing, so the lock is never held across
//! an await point.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::data::Employee;

/// Everything the router remembers between questions in one session:
/// a single "last employee" slot. Set on unambiguous ID/name resolution,
/// read by pronoun follow-ups, never cleared.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub last_employee: Option<Employee>,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, ConversationState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Clone of the session's state, or a fresh default for unseen ids.
    pub fn snapshot(&self, session_id: &str) -> ConversationState {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn commit(&self, session_id: &str, state: ConversationState) {
        self.sessions.write().insert(session_id.to_string(), state);
    }

    /// Drop a session entirely. Callers own session lifecycle.
    pub fn remove(&self, session_id: &str) {
        self.sessions.write().remove(session_id);
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::employees::tests::sample_directory;

    #[test]
    fn unseen_session_starts_empty() {
        let store = SessionStore::new();
        assert!(store.snapshot("s1").last_employee.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn sessions_are_isolated() {
        let directory = sample_directory();
        let store = SessionStore::new();

        let mut a = store.snapshot("a");
        a.last_employee = directory.by_id(101).cloned();
        store.commit("a", a);

        let mut b = store.snapshot("b");
        b.last_employee = directory.by_id(102).cloned();
        store.commit("b", b);

        assert_eq!(store.snapshot("a").last_employee.unwrap().id, 101);
        assert_eq!(store.snapshot("b").last_employee.unwrap().id, 102);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn remove_forgets_the_pointer() {
        let directory = sample_directory();
        let store = SessionStore::new();
        let mut state = store.snapshot("a");
        state.last_employee = directory.by_id(101).cloned();
        store.commit("a", state);

        store.remove("a");
        assert!(store.snapshot("a").last_employee.is_none());
    }
}
