//! File-backed storage backend.
//!
//! # File Structure
//!
//! Each storage id is saved to its own file:
//! ```text
//! {dir}/{storage_id}.json
//! ```
//!
//! # Design Notes
//!
//! - **Atomic writes**: Write to temp file, then rename (prevents corruption)
//! - **Flat layout**: Storage ids must be a single path component

use std::fs;
use std::path::{Component, Path, PathBuf};

use super::{KeyValueStorage, StorageError};

const EXTENSION: &str = "json";

/// Key-value storage persisted as one file per id.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `dir`. The directory is created lazily on
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn value_path(&self, id: &str) -> Result<PathBuf, StorageError> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{id}.{EXTENSION}")))
    }

    fn temp_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}.tmp"))
    }
}

/// Reject ids that would escape the storage directory or nest inside it.
fn validate_id(id: &str) -> Result<(), StorageError> {
    if id.is_empty() {
        return Err(StorageError::InvalidKey("storage id cannot be empty".to_string()));
    }

    let mut components = Path::new(id).components();
    match components.next() {
        Some(Component::Normal(_)) if components.next().is_none() => Ok(()),
        _ => Err(StorageError::InvalidKey(id.to_string())),
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, id: &str) -> Result<Option<String>, StorageError> {
        let path = self.value_path(id)?;

        if !path.exists() {
            return Ok(None);
        }

        Ok(Some(fs::read_to_string(&path)?))
    }

    /// Save a value to disk.
    ///
    /// # Atomic Write Strategy
    ///
    /// 1. Write to `{id}.json.tmp`
    /// 2. Rename to `{id}.json`
    ///
    /// A reader never observes a half-written value.
    fn set(&self, id: &str, value: &str) -> Result<(), StorageError> {
        let path = self.value_path(id)?;
        fs::create_dir_all(&self.dir)?;

        let temp_path = self.temp_path(id);
        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    /// Remove the value and any temp file left by an interrupted write.
    fn remove(&self, id: &str) -> Result<(), StorageError> {
        let path = self.value_path(id)?;

        for path in [path, self.temp_path(id)] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }

        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let suffix = format!(".{EXTENSION}");
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(id) = name.strip_suffix(&suffix) {
                if !id.is_empty() {
                    ids.push(id.to_string());
                }
            }
        }

        log::debug!("Found {} stored values in {}", ids.len(), self.dir.display());
        Ok(ids)
    }
}

// ============================================================================
// TESTS
// ============================================================================
