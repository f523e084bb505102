//! Session Registry
//!
//! Maps session ids to live per-session servers. A session exists from a
//! successful initialization until it is closed; ids are never reused.

use crate::error::{BrokerError, BrokerResult};
use kernel::id::SessionId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct SessionRegistry<T> {
    sessions: RwLock<HashMap<SessionId, Arc<T>>>,
}

impl<T> Default for SessionRegistry<T> {
    fn default() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> SessionRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh id and register the session built for it
    pub async fn create<F>(&self, factory: F) -> (SessionId, Arc<T>)
    where
        F: FnOnce(SessionId) -> T,
    {
        let id = SessionId::new();
        let session = Arc::new(factory(id));
        self.sessions.write().await.insert(id, session.clone());
        tracing::info!(session_id = %id, "Session opened");
        (id, session)
    }

    pub async fn resolve(&self, id: &SessionId) -> Option<Arc<T>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Resolve the raw `mcp-session-id` header value
    ///
    /// Absent, malformed and unknown ids all yield `MissingSession`.
    pub async fn resolve_header(&self, raw: Option<&str>) -> BrokerResult<(SessionId, Arc<T>)> {
        let id = raw
            .and_then(|v| v.parse::<SessionId>().ok())
            .ok_or(BrokerError::MissingSession)?;
        let session = self.resolve(&id).await.ok_or(BrokerError::MissingSession)?;
        Ok((id, session))
    }

    /// Remove a session; returns whether it was live
    pub async fn close(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Session closed");
        }
        removed
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
