//! Client-local persistent state
//!
//! One cache key holds the legacy `{users, assets, assignments}` blob
//! consumed by the reconciliation engine; two session keys hold the
//! opaque auth token and the serialized current user. On this side the
//! keys are plain files under a data directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use common::models::User;

use crate::error::ClientResult;

/// Read-then-delete access to the legacy local cache
pub trait LegacyCache {
    /// Load the raw blob; a missing cache is `Ok(None)`
    fn load(&self) -> ClientResult<Option<String>>;

    /// Remove the blob; removing a missing cache is not an error
    fn remove(&self) -> ClientResult<()>;
}

/// File-backed legacy cache, one file per the single cache key
pub struct FileLegacyCache {
    path: PathBuf,
}

impl FileLegacyCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the cache path from `ZIMMET_CACHE_PATH`, defaulting to
    /// `zimmet_store_v1.json` in the working directory
    pub fn from_env() -> Self {
        let path = std::env::var("ZIMMET_CACHE_PATH")
            .unwrap_or_else(|_| "zimmet_store_v1.json".to_string());
        Self::new(path)
    }
}

impl LegacyCache for FileLegacyCache {
    fn load(&self) -> ClientResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory legacy cache, used by tests and embedded callers
#[derive(Default)]
pub struct MemoryLegacyCache {
    inner: Mutex<Option<String>>,
}

impl MemoryLegacyCache {
    /// Empty cache, equivalent to a client that never stored the blob
    pub fn empty() -> Self {
        Self::default()
    }

    /// Cache seeded with a raw blob
    pub fn with_blob(raw: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(Some(raw.into())),
        }
    }
}

impl LegacyCache for MemoryLegacyCache {
    fn load(&self) -> ClientResult<Option<String>> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }

    fn remove(&self) -> ClientResult<()> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        Ok(())
    }
}

/// Session storage for the auth token and the current user
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join("auth_token")
    }

    fn user_path(&self) -> PathBuf {
        self.dir.join("auth_user.json")
    }

    fn read_optional(path: &Path) -> ClientResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove_optional(path: &Path) -> ClientResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the token and current user after a successful login
    pub fn save(&self, token: &str, user: &User) -> ClientResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.token_path(), token)?;
        fs::write(self.user_path(), serde_json::to_string(user)?)?;
        Ok(())
    }

    /// The stored auth token, if any
    pub fn token(&self) -> ClientResult<Option<String>> {
        Self::read_optional(&self.token_path())
    }

    /// The stored current user, if any
    pub fn current_user(&self) -> ClientResult<Option<User>> {
        match Self::read_optional(&self.user_path())? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Drop both session keys (logout)
    pub fn clear(&self) -> ClientResult<()> {
        Self::remove_optional(&self.token_path())?;
        Self::remove_optional(&self.user_path())?;
        Ok(())
    }
}
