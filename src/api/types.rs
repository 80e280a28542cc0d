//! Shared state for the API layer.

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::Config;
use crate::detector::session::{self, SessionHandle};
use crate::detector::Lexicon;
use crate::narration::Narrator;
use crate::sessions::{RegistryError, SessionRegistry};

/// Shared context for all API routes: the session registry plus the
/// immutable pieces every new session needs (lexicon, narrator, config).
#[derive(Clone)]
pub struct ApiContext {
    pub sessions: Arc<RwLock<SessionRegistry>>,
    pub lexicon: Arc<Lexicon>,
    pub narrator: Arc<Narrator>,
    pub config: Arc<Config>,
}

impl ApiContext {
    pub fn new(config: Config, lexicon: Lexicon, narrator: Narrator) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(SessionRegistry::new())),
            lexicon: Arc::new(lexicon),
            narrator: Arc::new(narrator),
            config: Arc::new(config),
        }
    }

    /// Spawn a session engine and register it.
    pub async fn open_session(&self) -> Uuid {
        let handle = session::spawn(
            self.config.detector.clone(),
            Arc::clone(&self.lexicon),
            Arc::clone(&self.narrator),
        );
        self.sessions.write().await.insert(handle)
    }

    /// End a session: unregister first, then shut the engine down so the
    /// registry lock is never held across the await.
    pub async fn end_session(&self, id: &Uuid) -> Result<(), RegistryError> {
        let handle = self.sessions.write().await.remove(id)?;
        handle.shutdown().await;
        Ok(())
    }

    /// Tear down every live session (process shutdown).
    pub async fn end_all(&self) {
        let handles: Vec<SessionHandle> = self.sessions.write().await.drain();
        for handle in handles {
            handle.shutdown().await;
        }
    }
}
