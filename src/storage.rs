//! Session Storage Module
//!
//! Persists session data as JSON files under the user's local data
//! directory, so a login survives between CLI invocations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// File-backed store for small JSON documents keyed by name
pub struct SessionStore {
    storage_path: PathBuf,
}

impl SessionStore {
    /// Create a store rooted at the default data directory
    pub fn new() -> Self {
        let storage_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vaxbook");

        Self::at(storage_path)
    }

    /// Create a store rooted at an explicit directory
    pub fn at(storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();

        if let Err(e) = std::fs::create_dir_all(&storage_path) {
            error!("Failed to create storage directory: {}", e);
        }

        debug!("Session store initialized at: {:?}", storage_path);

        Self { storage_path }
    }

    /// Save a value under the given key
    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(data)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let file_path = self.storage_path.join(format!("{}.json", key));
        std::fs::write(&file_path, json).map_err(|e| StorageError::Io(e.to_string()))?;

        info!("Saved data for key: {}", key);
        Ok(())
    }

    /// Load the value stored under the given key
    pub fn load<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<T, StorageError> {
        let file_path = self.storage_path.join(format!("{}.json", key));

        let json = std::fs::read_to_string(&file_path)
            .map_err(|e| StorageError::Io(e.to_string()))?;

        serde_json::from_str(&json).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Delete the value stored under the given key
    pub fn delete(&self, key: &str) -> Result<(), StorageError> {
        let file_path = self.storage_path.join(format!("{}.json", key));

        if file_path.exists() {
            std::fs::remove_file(&file_path).map_err(|e| StorageError::Io(e.to_string()))?;
            info!("Deleted stored data for key: {}", key);
        }

        Ok(())
    }

    /// Check if key exists
    pub fn exists(&self, key: &str) -> bool {
        let file_path = self.storage_path.join(format!("{}.json", key));
        file_path.exists()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;

    #[test]
    fn session_roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path());

        let session = Session::from_token("abc".to_string(), "bearer".to_string());
        store.save("session", &session).unwrap();
        assert!(store.exists("session"));

        let loaded: Session = store.load("session").unwrap();
        assert_eq!(loaded.access_token, "abc");
        assert_eq!(loaded.token_type, "bearer");
        assert_eq!(loaded.expires_at, session.expires_at);
    }

    #[test]
    fn delete_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path());

        let session = Session::from_token("abc".to_string(), "bearer".to_string());
        store.save("session", &session).unwrap();
        store.delete("session").unwrap();
        assert!(!store.exists("session"));

        let result: Result<Session, _> = store.load("session");
        assert!(matches!(result, Err(StorageError::Io(_))));
    }

    #[test]
    fn delete_of_missing_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path());
        assert!(store.delete("never-saved").is_ok());
    }

    #[test]
    fn corrupt_file_surfaces_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path());

        std::fs::write(dir.path().join("session.json"), "not json").unwrap();
        let result: Result<Session, _> = store.load("session");
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }
}
