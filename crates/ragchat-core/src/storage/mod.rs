//! Durable key-value storage for chat transcripts.
//!
//! # Overview
//!
//! The session layer never touches files or browser storage directly. It
//! talks to a [`KeyValueStorage`], a flat string-to-string map addressed by
//! storage id (see [`SessionKey::storage_id`](crate::session::SessionKey::storage_id)).
//!
//! - [`MemoryStorage`] - in-process map, optional byte quota
//! - [`FileStorage`] - one file per storage id under a directory
//!
//! # Contract
//!
//! - `get` of an id that was never set returns `Ok(None)`
//! - `set` replaces the whole value (snapshot overwrite, never append)
//! - `keys` lists only ids written through the storage, so callers can
//!   remove their own slots without touching anything else
//! - no multi-key transactions
//!
//! ```text
//! ~/.config/ragchat/storage/
//! ├── chat_support_bot_app.json
//! └── chat_docs_app.json
//! ```

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error (permission denied, disk full, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The storage id cannot be used as a slot name.
    #[error("Invalid storage id: {0}")]
    InvalidKey(String),

    /// Writing the value would exceed the configured quota.
    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },
}

/// A flat string key-value store with whole-value writes.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `id`, if any.
    fn get(&self, id: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `id`.
    fn set(&self, id: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `id`. Removing a missing id succeeds.
    fn remove(&self, id: &str) -> Result<(), StorageError>;

    /// Every id currently holding a value, in no particular order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}
