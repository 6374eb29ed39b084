//! Consent flag storage
//!
//! The widget keeps one string flag in client-local key/value storage. Only
//! the exact value `"true"` counts as consent.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

const CONSENT_VALUE: &str = "true";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Storage file {path} is not a JSON object: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Persistent consent flag
pub trait ConsentStore: Send + Sync {
    /// Whether consent has been stored
    fn load(&self) -> Result<bool, StorageError>;

    /// Record consent
    fn store(&self) -> Result<(), StorageError>;
}

impl<T: ConsentStore + ?Sized> ConsentStore for Arc<T> {
    fn load(&self) -> Result<bool, StorageError> {
        (**self).load()
    }

    fn store(&self) -> Result<(), StorageError> {
        (**self).store()
    }
}

/// Key/value JSON file standing in for browser local storage
#[derive(Debug, Clone)]
pub struct FileConsentStore {
    path: PathBuf,
    key: String,
}

impl FileConsentStore {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_items(&self) -> Result<Map<String, Value>, StorageError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&content).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })
    }
}

impl ConsentStore for FileConsentStore {
    fn load(&self) -> Result<bool, StorageError> {
        let items = self.read_items()?;
        Ok(items.get(&self.key).and_then(Value::as_str) == Some(CONSENT_VALUE))
    }

    fn store(&self) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        // Other keys in the file are preserved
        let mut items = self.read_items()?;
        items.insert(self.key.clone(), Value::String(CONSENT_VALUE.to_string()));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(&items).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, content).map_err(io_err)?;

        tracing::info!(path = %self.path.display(), key = %self.key, "Consent stored");
        Ok(())
    }
}

/// In-memory store, for hosts without persistence and for tests
#[derive(Debug, Default)]
pub struct MemoryConsentStore {
    given: Mutex<bool>,
}

impl MemoryConsentStore {
    pub fn new(given: bool) -> Self {
        Self {
            given: Mutex::new(given),
        }
    }
}

impl ConsentStore for MemoryConsentStore {
    fn load(&self) -> Result<bool, StorageError> {
        Ok(*self.given.lock().unwrap_or_else(std::sync::PoisonError::into_inner))
    }

    fn store(&self) -> Result<(), StorageError> {
        *self.given.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = true;
        Ok(())
    }
}
