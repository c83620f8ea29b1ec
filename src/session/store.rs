//! Session storage and per-user serialization.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::session::Session;

/// Storage for per-user sessions.
///
/// Implementations must be safe to share across tasks. They do not
/// serialize access per user; callers hold a [`UserLocks`] guard around
/// each read-modify-write cycle.
pub trait SessionStore: Send + Sync {
    /// Load the session for `user_id`, creating a default one on first contact.
    fn get(&self, user_id: &str) -> Session;

    /// Store `session` under its `user_id`, replacing any previous record.
    fn put(&self, session: Session);

    /// Number of known sessions.
    fn len(&self) -> usize;

    /// Whether no session has been created yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-lifetime session store backed by a hash map.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, user_id: &str) -> Session {
        if let Some(session) = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
        {
            return session.clone();
        }

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(user_id.to_owned())
            .or_insert_with(|| Session::new(user_id))
            .clone()
    }

    fn put(&self, session: Session) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.user_id.clone(), session);
    }

    fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// One async mutex per user, handed out on demand.
///
/// Holding the guard while an event is handled keeps at most one event in
/// flight per user; different users proceed concurrently.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    /// Create an empty lock registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`'s session.
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(user_id.to_owned()).or_default())
        };
        lock.lock_owned().await
    }
}
