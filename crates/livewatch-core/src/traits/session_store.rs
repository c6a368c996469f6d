// # Session Store Trait
//
// Defines the interface for durable session bookkeeping.
//
// ## Purpose
//
// The session store backs the restart-safe notification path by tracking,
// per stream session id:
// - The session title and start time
// - Whether the "start" announcement has already been sent
//
// ## Implementations
//
// - In-memory: `MemorySessionStore` (not durable)
// - File-based: `FileSessionStore` (atomic JSON writes, backup recovery)

use async_trait::async_trait;

use crate::model::Session;

/// Trait for session store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
/// Writes for the same session id must be linearizable; an implementation
/// gets this from its own locking or transactional guarantees.
///
/// # Responsibilities
///
/// - ✅ Persist sessions durably (for durable implementations)
/// - ✅ Reject a second insert for an existing session id
/// - ❌ Decide whether to notify (owned by `SessionRecorder`)
/// - ❌ Delete sessions (retention is out of scope)
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get a session by id
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: The stored session
    /// - `Ok(None)`: No session with that id
    /// - `Err(Error::Persistence)`: Storage error
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, crate::Error>;

    /// Insert a new session
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Inserted
    /// - `Err(Error::Persistence)`: Storage error, or the id already exists
    async fn insert_session(&self, session: &Session) -> Result<(), crate::Error>;

    /// Set `notification_sent = true` for a session
    ///
    /// The flag never flips back.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Flag set (or already set)
    /// - `Err(Error::Persistence)`: Storage error, or no such session
    async fn mark_notified(&self, session_id: &str) -> Result<(), crate::Error>;
}
