//! Chat sessions: identity, transcript entries, and the store that persists
//! them.
//!
//! A session is one bot-scoped, kind-scoped conversation. Its transcript is
//! append-only and survives restarts through a [`KeyValueStorage`](crate::storage::KeyValueStorage).

mod entry;
mod key;
mod store;

pub use entry::{ChatEntry, Sender, Transcript};
pub use key::{SessionKey, SessionKind};
pub use store::SessionStore;
