//! Session registry.
//!
//! Tracks every live treatment session by id. Handles live only in
//! memory: a session that is not in the registry does not exist, and
//! removing one is the only way to reach its engine for teardown.

use std::collections::HashMap;

use uuid::Uuid;

use crate::detector::session::SessionHandle;

/// All live sessions, keyed by session id.
pub struct SessionRegistry {
    sessions: HashMap<Uuid, SessionHandle>,
}

/// Errors from registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("No live session with id {0}")]
    SessionNotFound(Uuid),
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Register a freshly spawned session.
    pub fn insert(&mut self, handle: SessionHandle) -> Uuid {
        let id = handle.id();
        self.sessions.insert(id, handle);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&SessionHandle> {
        self.sessions.get(id)
    }

    /// Remove a session from the registry, handing its handle back so
    /// the caller can shut the engine down without holding the registry
    /// lock across the await.
    pub fn remove(&mut self, id: &Uuid) -> Result<SessionHandle, RegistryError> {
        self.sessions
            .remove(id)
            .ok_or(RegistryError::SessionNotFound(*id))
    }

    /// Drain every session (app shutdown).
    pub fn drain(&mut self) -> Vec<SessionHandle> {
        self.sessions.drain().map(|(_, handle)| handle).collect()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.sessions.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
