//! # ragchat-core
//!
//! Session and ingestion core for a retrieval-augmented chat client.
//!
//! This crate is framework-agnostic and can be used by:
//! - the `ragchat` terminal client
//! - any other front-end that can render a transcript and subscribe to events
//!
//! ## Key Concepts
//!
//! - **Session**: the transcript of one bot under one application kind,
//!   identified by a [`SessionKey`]
//! - **SessionStore**: in-memory transcripts mirrored to durable storage
//! - **ConversationController**: runs the ask and add-source workflows
//!   against a [`RemoteService`]
//! - **ConversationEvent**: what a front-end re-renders on

pub mod config;
pub mod controller;
pub mod event_bus;
pub mod paths;
pub mod remote;
pub mod session;
pub mod sources;
pub mod storage;

// Re-export commonly used types
pub use config::ClientConfig;
pub use controller::{AskOutcome, ControllerError, ConversationController, IngestOutcome};
pub use event_bus::{ConversationEvent, EventBus};
pub use remote::{BotRegistry, HttpRemoteService, ModelConfig, RemoteError, RemoteService};
pub use session::{ChatEntry, Sender, SessionKey, SessionKind, SessionStore, Transcript};
pub use sources::{SourceDraft, SourceKind};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
