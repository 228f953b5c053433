//! SessionStore - one transcript per session key, mirrored to durable storage.
//!
//! # Reconciliation
//!
//! - **Load**: `open` hydrates from durable storage (durable wins). Missing or
//!   malformed data yields an empty transcript.
//! - **Append**: entries are added in memory, then the whole transcript is
//!   written back as one value (snapshot overwrite, not a log).
//! - **Failed writes**: logged and swallowed. The in-memory copy stays
//!   authoritative for that key until it is closed, so a later `open` does not
//!   roll it back to the stale durable value.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::entry::{self, ChatEntry, Transcript};
use super::key::{SessionKey, STORAGE_PREFIX};
use crate::storage::{KeyValueStorage, StorageError};

/// In-memory state for one attached session.
#[derive(Debug, Default)]
struct Slot {
    entries: Transcript,
    /// False when the last durable write for this key failed.
    in_sync: bool,
}

/// Manages transcripts for every open session.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    slots: Mutex<HashMap<SessionKey, Slot>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Load the transcript for `key`.
    ///
    /// Never fails: unreadable or malformed durable data is discarded and an
    /// empty transcript is returned. Calling `open` repeatedly returns the
    /// same entries without duplicating them.
    pub fn open(&self, key: &SessionKey) -> Transcript {
        let mut slots = self.slots();

        if let Some(slot) = slots.get(key) {
            if !slot.in_sync {
                log::debug!("Keeping unsaved in-memory transcript for {key}");
                return slot.entries.clone();
            }
        }

        let entries = self.load_durable(key);
        slots.insert(
            key.clone(),
            Slot {
                entries: entries.clone(),
                in_sync: true,
            },
        );
        entries
    }

    /// The attached transcript for `key`, hydrating it first if needed.
    ///
    /// Unlike [`open`](Self::open) this does not re-read durable storage for a
    /// session that is already attached.
    pub fn current(&self, key: &SessionKey) -> Transcript {
        {
            let slots = self.slots();
            if let Some(slot) = slots.get(key) {
                return slot.entries.clone();
            }
        }
        self.open(key)
    }

    /// Append `entries` to the transcript for `key` and write the full
    /// transcript back to durable storage.
    ///
    /// The lock is held across the write so a concurrent append cannot
    /// interleave between the memory update and the snapshot it produces.
    pub fn append(&self, key: &SessionKey, entries: impl IntoIterator<Item = ChatEntry>) {
        let mut slots = self.slots();

        // Appending to a session that was never opened must not clobber what
        // is already stored for it.
        let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
            entries: self.load_durable(key),
            in_sync: true,
        });

        let before = slot.entries.len();
        slot.entries.extend(entries);
        let added = slot.entries.len() - before;

        match self.persist(key, &slot.entries) {
            Ok(()) => {
                slot.in_sync = true;
                log::debug!(
                    "Persisted {} entries for {} ({} new)",
                    slot.entries.len(),
                    key,
                    added
                );
            }
            Err(e) => {
                slot.in_sync = false;
                log::warn!("Failed to persist transcript for {key}: {e}");
            }
        }
    }

    /// Detach the in-memory transcript for `key`. Durable storage is kept.
    pub fn close(&self, key: &SessionKey) {
        self.slots().remove(key);
    }

    /// Whether a transcript for `key` is currently attached.
    pub fn is_open(&self, key: &SessionKey) -> bool {
        self.slots().contains_key(key)
    }

    /// Delete every stored chat and detach all in-memory transcripts.
    ///
    /// Only transcript slots are removed; other values sharing the storage
    /// are left alone.
    pub fn purge_all(&self) -> Result<(), StorageError> {
        let mut slots = self.slots();

        let ids: Vec<String> = self
            .storage
            .keys()?
            .into_iter()
            .filter(|id| id.starts_with(STORAGE_PREFIX))
            .collect();
        for id in &ids {
            self.storage.remove(id)?;
        }
        slots.clear();

        log::info!("Purged {} stored chats", ids.len());
        Ok(())
    }

    fn load_durable(&self, key: &SessionKey) -> Transcript {
        let id = key.storage_id();

        let raw = match self.storage.get(&id) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Transcript::new(),
            Err(e) => {
                log::warn!("Failed to read stored transcript {id}: {e}");
                return Transcript::new();
            }
        };

        match entry::decode(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Discarding malformed transcript {id}: {e}");
                Transcript::new()
            }
        }
    }

    fn persist(&self, key: &SessionKey, entries: &[ChatEntry]) -> Result<(), PersistError> {
        let raw = entry::encode(entries)?;
        self.storage.set(&key.storage_id(), &raw)?;
        Ok(())
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<SessionKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, thiserror::Error)]
enum PersistError {
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};
    use tempfile::tempdir;

    fn memory_store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());
        (storage, store)
    }

    mod open {
        use super::*;

        #[test]
        fn missing_key_yields_empty_transcript() {
            let (_, store) = memory_store();
            assert!(store.open(&SessionKey::app("docs")).is_empty());
        }

        #[test]
        fn is_idempotent() {
            let (_, store) = memory_store();
            let key = SessionKey::app("docs");
            store.append(&key, [ChatEntry::human("q"), ChatEntry::bot("a")]);

            let first = store.open(&key);
            let second = store.open(&key);

            assert_eq!(first, second);
            assert_eq!(first.len(), 2);
        }

        #[test]
        fn hydrates_from_existing_storage() {
            let (storage, store) = memory_store();
            storage
                .set(
                    "chat_docs_app",
                    r#"{"chats":[{"sender":"H","message":"from before"}]}"#,
                )
                .unwrap();

            let transcript = store.open(&SessionKey::app("docs"));
            assert_eq!(transcript, vec![ChatEntry::human("from before")]);
        }

        #[test]
        fn malformed_data_yields_empty_transcript() {
            let (storage, store) = memory_store();
            storage.set("chat_docs_app", "{not json").unwrap();

            assert!(store.open(&SessionKey::app("docs")).is_empty());
        }

        #[test]
        fn durable_copy_wins_over_memory_on_reload() {
            let (storage, store) = memory_store();
            let key = SessionKey::app("docs");
            store.append(&key, [ChatEntry::human("one")]);

            // Another writer replaced the stored value.
            storage
                .set(
                    &key.storage_id(),
                    r#"{"chats":[{"sender":"B","message":"elsewhere"}]}"#,
                )
                .unwrap();

            assert_eq!(store.open(&key), vec![ChatEntry::bot("elsewhere")]);
        }
    }

    mod append {
        use super::*;

        #[test]
        fn durable_copy_matches_memory() {
            let (storage, store) = memory_store();
            let key = SessionKey::app("docs");

            store.append(&key, [ChatEntry::human("q1"), ChatEntry::bot("a1")]);
            store.append(&key, [ChatEntry::human("q2")]);

            let raw = storage.get(&key.storage_id()).unwrap().unwrap();
            assert_eq!(entry::decode(&raw).unwrap(), store.current(&key));
        }

        #[test]
        fn fresh_store_sees_all_appends_in_order() {
            let storage = Arc::new(MemoryStorage::new());
            let key = SessionKey::app("docs");
            {
                let store = SessionStore::new(storage.clone());
                store.open(&key);
                store.append(&key, [ChatEntry::human("1")]);
                store.append(&key, [ChatEntry::bot("2"), ChatEntry::bot("3")]);
                store.append(&key, Vec::<ChatEntry>::new());
                store.append(&key, [ChatEntry::human("4")]);
            }

            let reloaded = SessionStore::new(storage).open(&key);
            let messages: Vec<&str> = reloaded.iter().map(|e| e.message.as_str()).collect();
            assert_eq!(messages, ["1", "2", "3", "4"]);
        }

        #[test]
        fn without_open_keeps_existing_entries() {
            let (storage, store) = memory_store();
            storage
                .set(
                    "chat_docs_app",
                    r#"{"chats":[{"sender":"H","message":"old"}]}"#,
                )
                .unwrap();

            let key = SessionKey::app("docs");
            store.append(&key, [ChatEntry::bot("new")]);

            assert_eq!(
                SessionStore::new(storage).open(&key),
                vec![ChatEntry::human("old"), ChatEntry::bot("new")]
            );
        }

        #[test]
        fn keys_are_isolated() {
            let (_, store) = memory_store();
            let a = SessionKey::app("alpha");
            let b = SessionKey::app("beta");
            store.append(&b, [ChatEntry::human("b only")]);
            let before = store.open(&b);

            store.append(&a, [ChatEntry::human("a only")]);

            assert_eq!(store.open(&b), before);
            assert_eq!(store.open(&a), vec![ChatEntry::human("a only")]);
        }

        #[test]
        fn underscore_slugs_do_not_collide() {
            let (_, store) = memory_store();
            let plain = SessionKey::app("a");
            let tricky = SessionKey::app("a_app");
            store.append(&plain, [ChatEntry::human("plain")]);

            assert!(store.open(&tricky).is_empty());
        }

        #[test]
        fn failed_write_keeps_memory_authoritative() {
            let storage = Arc::new(MemoryStorage::with_quota(64));
            let store = SessionStore::new(storage.clone());
            let key = SessionKey::app("docs");

            store.append(&key, [ChatEntry::human("short")]);
            let saved = storage.get(&key.storage_id()).unwrap();

            store.append(&key, [ChatEntry::bot("x".repeat(200))]);

            // Durable copy still holds the last good snapshot...
            assert_eq!(storage.get(&key.storage_id()).unwrap(), saved);
            // ...while the attached session keeps everything.
            let transcript = store.open(&key);
            assert_eq!(transcript.len(), 2);
            assert_eq!(transcript[0], ChatEntry::human("short"));
        }
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn close_detaches_without_deleting() {
            let (storage, store) = memory_store();
            let key = SessionKey::app("docs");
            store.append(&key, [ChatEntry::human("keep")]);
            assert!(store.is_open(&key));

            store.close(&key);

            assert!(!store.is_open(&key));
            assert!(storage.get(&key.storage_id()).unwrap().is_some());
            assert_eq!(store.open(&key), vec![ChatEntry::human("keep")]);
        }

        #[test]
        fn close_after_failed_write_falls_back_to_durable() {
            let storage = Arc::new(MemoryStorage::with_quota(64));
            let store = SessionStore::new(storage);
            let key = SessionKey::app("docs");
            store.append(&key, [ChatEntry::human("short")]);
            store.append(&key, [ChatEntry::bot("x".repeat(200))]);

            store.close(&key);

            assert_eq!(store.open(&key), vec![ChatEntry::human("short")]);
        }

        #[test]
        fn purge_all_clears_storage_and_memory() {
            let (storage, store) = memory_store();
            let a = SessionKey::app("alpha");
            let b = SessionKey::app("beta");
            store.append(&a, [ChatEntry::human("1")]);
            store.append(&b, [ChatEntry::human("2")]);

            store.purge_all().unwrap();

            assert!(storage.is_empty());
            assert!(!store.is_open(&a));
            assert!(store.open(&a).is_empty());
            assert!(store.open(&b).is_empty());
        }

        #[test]
        fn purge_all_leaves_other_values_alone() {
            let (storage, store) = memory_store();
            storage.set("theme", "dark").unwrap();
            store.append(&SessionKey::app("alpha"), [ChatEntry::human("1")]);

            store.purge_all().unwrap();

            assert_eq!(storage.keys().unwrap(), vec!["theme".to_string()]);
        }

        #[test]
        fn purge_all_keeps_unrelated_files_in_shared_dir() {
            let dir = tempdir().unwrap();
            let config = crate::config::ClientConfig::default();
            config.save(dir.path()).unwrap();
            std::fs::write(dir.path().join("unrelated.json"), "{}").unwrap();

            let store = SessionStore::new(Arc::new(FileStorage::new(dir.path())));
            let key = SessionKey::app("docs");
            store.append(&key, [ChatEntry::human("bye")]);
            assert!(dir.path().join("chat_docs_app.json").exists());

            store.purge_all().unwrap();

            assert!(!dir.path().join("chat_docs_app.json").exists());
            assert!(dir.path().join("config.json").exists());
            assert!(dir.path().join("unrelated.json").exists());
            assert!(store.open(&key).is_empty());
        }

        #[test]
        fn file_storage_round_trip_across_instances() {
            let dir = tempdir().unwrap();
            let key = SessionKey::app("docs");

            SessionStore::new(Arc::new(FileStorage::new(dir.path())))
                .append(&key, [ChatEntry::human("persist me")]);

            let reopened = SessionStore::new(Arc::new(FileStorage::new(dir.path())));
            assert_eq!(reopened.open(&key), vec![ChatEntry::human("persist me")]);
        }

        #[test]
        fn invalid_storage_id_still_keeps_memory() {
            let dir = tempdir().unwrap();
            let store = SessionStore::new(Arc::new(FileStorage::new(dir.path())));
            let key = SessionKey::app("../escape");

            store.append(&key, [ChatEntry::human("hi")]);

            assert_eq!(store.open(&key), vec![ChatEntry::human("hi")]);
        }
    }
}
