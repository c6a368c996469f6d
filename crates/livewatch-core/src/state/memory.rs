// # Memory Stores
//
// In-memory implementations of SessionStore and DeviceTokenStore.
//
// ## Crash Behavior
//
// - All sessions are lost on restart/crash
// - A stream that is live at the first tick after a restart is announced again
// - No recovery possible (state is in-memory only)
//
// ## When to Use
//
// - Testing environments
// - Deployments where a repeated "stream started" after restart is acceptable

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::catalog::DeviceTokenStore;
use crate::model::Session;
use crate::traits::SessionStore;

/// In-memory session store implementation
///
/// Sessions live in a HashMap protected by a RwLock. Each mutation takes the
/// write lock for its whole check-and-update, so writes for one session id
/// are linearizable.
///
/// # Example
///
/// ```rust,no_run
/// use livewatch_core::state::MemorySessionStore;
/// use livewatch_core::traits::SessionStore;
/// use livewatch_core::Session;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemorySessionStore::new();
///
///     store.insert_session(&Session::started("abc", "Hello")).await?;
///     assert!(store.get_session("abc").await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemorySessionStore {
    /// Create a new empty memory session store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the number of sessions in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(session_id).cloned())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        if guard.contains_key(&session.session_id) {
            return Err(Error::persistence(format!(
                "Session {} already recorded",
                session.session_id
            )));
        }
        guard.insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn mark_notified(&self, session_id: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        let session = guard
            .get_mut(session_id)
            .ok_or_else(|| Error::persistence(format!("Session {} not found", session_id)))?;
        session.notification_sent = true;
        Ok(())
    }
}

/// In-memory device token registry
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    tokens: Arc<RwLock<BTreeSet<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceTokenStore for MemoryTokenStore {
    async fn register_token(&self, token: &str) -> Result<(), Error> {
        self.tokens.write().await.insert(token.to_string());
        Ok(())
    }

    async fn list_tokens(&self) -> Result<Vec<String>, Error> {
        Ok(self.tokens.read().await.iter().cloned().collect())
    }
}
