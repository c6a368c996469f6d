// # File Stores
//
// File-based implementations of SessionStore and DeviceTokenStore with crash
// recovery.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good state
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "records": {
//     "abc": {
//       "sessionId": "abc",
//       "title": "Hello",
//       "startedAt": "2025-01-09T12:00:00Z",
//       "endedAt": null,
//       "notificationSent": true
//     }
//   }
// }
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::catalog::DeviceTokenStore;
use crate::model::Session;
use crate::traits::SessionStore;

/// State file format version
/// Used for future migration if format changes
const STATE_FILE_VERSION: &str = "1.0";

/// Serializable state file format
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct StateFileFormat<T> {
    version: String,
    records: T,
}

/// Why a state file could not be loaded
enum LoadFailure {
    /// File exists but does not parse
    Corrupt(String),
    /// File could not be read
    Unreadable(Error),
}

/// A versioned JSON document on disk, written atomically
#[derive(Debug, Clone)]
struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    /// Prepare the file location, creating parent directories if needed
    async fn open(path: &Path) -> Result<Self, Error> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Load records, recovering from the backup if the main file is corrupt
    ///
    /// Recovery strategy:
    /// 1. Try to load main state file
    /// 2. If it does not parse, try loading backup
    /// 3. If backup also fails, start with empty state
    async fn load_with_recovery<T>(&self) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
    {
        let reason = match Self::load(&self.path).await {
            Ok(records) => {
                tracing::debug!("Loaded state from {}", self.path.display());
                return Ok(records);
            }
            Err(LoadFailure::Unreadable(e)) => return Err(e),
            Err(LoadFailure::Corrupt(reason)) => reason,
        };

        tracing::warn!(
            "State file appears corrupted: {}. Attempting recovery from backup.",
            reason
        );

        let backup_path = self.backup_path();
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with empty state.");
            return Ok(T::default());
        }

        match Self::load(&backup_path).await {
            Ok(records) => {
                tracing::info!("Recovered state from backup");
                if let Err(e) = fs::copy(&backup_path, &self.path).await {
                    tracing::error!("Failed to restore state file from backup: {}", e);
                }
                Ok(records)
            }
            Err(_) => {
                tracing::error!("Backup also corrupted. Starting with empty state.");
                Ok(T::default())
            }
        }
    }

    async fn load<T>(path: &Path) -> Result<T, LoadFailure>
    where
        T: DeserializeOwned + Default,
    {
        if !path.exists() {
            tracing::debug!("State file does not exist: {}", path.display());
            return Ok(T::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            LoadFailure::Unreadable(Error::persistence(format!(
                "Failed to read state file {}: {}",
                path.display(),
                e
            )))
        })?;

        let state_file: StateFileFormat<T> = serde_json::from_str(&content).map_err(|e| {
            LoadFailure::Corrupt(format!("{}: {}", path.display(), e))
        })?;

        if state_file.version != STATE_FILE_VERSION {
            tracing::warn!(
                "State file version mismatch: expected {}, got {}. Attempting to load anyway.",
                STATE_FILE_VERSION,
                state_file.version
            );
        }

        Ok(state_file.records)
    }

    /// Write records atomically, keeping the previous file as backup
    async fn write<T: Serialize>(&self, records: &T) -> Result<(), Error> {
        let state_file = StateFileFormat {
            version: STATE_FILE_VERSION.to_string(),
            records,
        };

        let json = serde_json::to_string_pretty(&state_file)
            .map_err(|e| Error::persistence(format!("Failed to serialize state: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists()
            && let Err(e) = fs::copy(&self.path, self.backup_path()).await
        {
            tracing::warn!("Failed to create backup: {}", e);
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::persistence(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("State written to file: {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(&self) -> PathBuf {
        let mut backup = self.path.clone();
        backup.set_extension("backup");
        backup
    }
}

/// File-based session store with crash recovery
///
/// Every mutation is applied and written to disk under one write lock, so
/// writes for the same session id are linearizable. If the disk write fails
/// the in-memory change is reverted and the error is returned.
///
/// # Example
///
/// ```rust,no_run
/// use livewatch_core::state::FileSessionStore;
/// use livewatch_core::traits::SessionStore;
/// use livewatch_core::Session;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileSessionStore::new("/var/lib/livewatch/sessions.json").await?;
///
///     store.insert_session(&Session::started("abc", "Hello")).await?;
///     store.mark_notified("abc").await?;
///
///     let session = store.get_session("abc").await?;
///     assert!(session.unwrap().notification_sent);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileSessionStore {
    file: JsonFile,
    sessions: RwLock<BTreeMap<String, Session>>,
}

impl FileSessionStore {
    /// Create or load a file session store
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = JsonFile::open(path.as_ref()).await?;
        let sessions: BTreeMap<String, Session> = file.load_with_recovery().await?;
        tracing::debug!("Loaded {} session(s)", sessions.len());

        Ok(Self {
            file,
            sessions: RwLock::new(sessions),
        })
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, Error> {
        let guard = self.sessions.read().await;
        Ok(guard.get(session_id).cloned())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), Error> {
        let mut guard = self.sessions.write().await;
        if guard.contains_key(&session.session_id) {
            return Err(Error::persistence(format!(
                "Session {} already recorded",
                session.session_id
            )));
        }

        guard.insert(session.session_id.clone(), session.clone());
        if let Err(e) = self.file.write(&*guard).await {
            guard.remove(&session.session_id);
            return Err(e);
        }
        Ok(())
    }

    async fn mark_notified(&self, session_id: &str) -> Result<(), Error> {
        let mut guard = self.sessions.write().await;
        let session = guard
            .get_mut(session_id)
            .ok_or_else(|| Error::persistence(format!("Session {} not found", session_id)))?;

        if session.notification_sent {
            return Ok(());
        }
        session.notification_sent = true;

        if let Err(e) = self.file.write(&*guard).await {
            if let Some(session) = guard.get_mut(session_id) {
                session.notification_sent = false;
            }
            return Err(e);
        }
        Ok(())
    }
}

/// File-based device token registry
#[derive(Debug)]
pub struct FileTokenStore {
    file: JsonFile,
    tokens: RwLock<BTreeMap<String, DateTime<Utc>>>,
}

impl FileTokenStore {
    /// Create or load a file token store
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = JsonFile::open(path.as_ref()).await?;
        let tokens = file.load_with_recovery().await?;

        Ok(Self {
            file,
            tokens: RwLock::new(tokens),
        })
    }
}

#[async_trait]
impl DeviceTokenStore for FileTokenStore {
    async fn register_token(&self, token: &str) -> Result<(), Error> {
        let mut guard = self.tokens.write().await;
        if guard.contains_key(token) {
            return Ok(());
        }

        guard.insert(token.to_string(), Utc::now());
        if let Err(e) = self.file.write(&*guard).await {
            guard.remove(token);
            return Err(e);
        }
        Ok(())
    }

    async fn list_tokens(&self) -> Result<Vec<String>, Error> {
        let guard = self.tokens.read().await;
        Ok(guard.keys().cloned().collect())
    }
}
