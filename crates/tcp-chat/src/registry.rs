use std::sync::Arc;

use parking_lot::Mutex;

use crate::session::{Session, SessionId};

/// Sessions currently eligible to receive broadcasts, in join order.
///
/// Membership is by identity: the same session is never listed twice, while
/// two sessions sharing a display name are distinct entries.
#[derive(Default)]
pub struct Registry {
    sessions: Mutex<Vec<Arc<Session>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the tail. Returns `false` if the session was already present.
    pub fn add(&self, session: Arc<Session>) -> bool {
        let mut sessions = self.sessions.lock();
        if sessions.iter().any(|s| s.id() == session.id()) {
            return false;
        }
        sessions.push(session);
        true
    }

    /// Remove the session with this identity. Returns `false` if it was absent.
    pub fn remove(&self, id: SessionId) -> bool {
        let mut sessions = self.sessions.lock();
        match sessions.iter().position(|s| s.id() == id) {
            Some(idx) => {
                sessions.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.lock().iter().any(|s| s.id() == id)
    }

    /// Point-in-time copy of the members, safe to iterate without the lock.
    pub fn snapshot(&self) -> Vec<Arc<Session>> {
        self.sessions.lock().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.sessions
            .lock()
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
