//! Session store: the bearer credential and where it is persisted.
//!
//! A [`Session`] is an explicit object created once and handed to
//! [`crate::api::ApiClient`]; nothing reads the credential from global state.
//! The token is persisted through a [`KeyValueStore`] under the fixed key
//! [`TOKEN_KEY`] so it survives process restarts, and is removed on logout.
//!
//! No validation happens here: any non-empty string is a usable credential,
//! and there is no expiry tracking.

use crate::error::PaperDeskError;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// Key under which the raw bearer token is persisted.
pub const TOKEN_KEY: &str = "token";

/// Durable string key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PaperDeskError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PaperDeskError>;
    fn remove(&self, key: &str) -> Result<(), PaperDeskError>;
}

/// A JSON object on disk, rewritten atomically on every change.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_err(&self, detail: impl std::fmt::Display) -> PaperDeskError {
        PaperDeskError::SessionStorage {
            path: self.path.clone(),
            detail: detail.to_string(),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, PaperDeskError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => serde_json::from_str(&text).map_err(|e| self.storage_err(e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(self.storage_err(e)),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), PaperDeskError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| self.storage_err(e))?;

        let json = serde_json::to_string_pretty(entries).map_err(|e| self.storage_err(e))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| self.storage_err(e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| self.storage_err(e))?;
        tmp.persist(&self.path).map_err(|e| self.storage_err(e.error))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PaperDeskError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PaperDeskError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), PaperDeskError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// Process-local store, used by tests and one-shot tools.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PaperDeskError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PaperDeskError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PaperDeskError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// The current bearer credential, mirrored to a [`KeyValueStore`].
pub struct Session {
    store: Box<dyn KeyValueStore>,
    token: RwLock<Option<String>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl Session {
    /// Open a session backed by `store`, loading any persisted token.
    pub fn create(store: impl KeyValueStore + 'static) -> Result<Arc<Self>, PaperDeskError> {
        let token = store.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
        debug!(authenticated = token.is_some(), "session opened");
        Ok(Arc::new(Self {
            store: Box::new(store),
            token: RwLock::new(token),
        }))
    }

    /// Open a session persisted at `path`.
    pub fn open_file(path: impl Into<PathBuf>) -> Result<Arc<Self>, PaperDeskError> {
        Self::create(FileStore::new(path))
    }

    /// A session that is never written to disk.
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self {
            store: Box::new(MemoryStore::default()),
            token: RwLock::new(None),
        })
    }

    /// The current token, if any.
    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Store `token` in memory and in the backing store.
    ///
    /// An empty string clears the session instead.
    pub fn set_token(&self, token: impl Into<String>) -> Result<(), PaperDeskError> {
        let token = token.into();
        if token.is_empty() {
            return self.clear();
        }
        self.store.set(TOKEN_KEY, &token)?;
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token);
        debug!("session token stored");
        Ok(())
    }

    /// Forget the token (logout).
    pub fn clear(&self) -> Result<(), PaperDeskError> {
        self.store.remove(TOKEN_KEY)?;
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
        debug!("session token cleared");
        Ok(())
    }

    /// End the session's lifecycle, removing the persisted credential.
    pub fn destroy(self: Arc<Self>) -> Result<(), PaperDeskError> {
        self.clear()
    }
}
