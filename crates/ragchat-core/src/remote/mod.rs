//! Collaborators the core talks to over the network.
//!
//! - [`RemoteService`] answers questions and ingests sources
//! - [`BotRegistry`] lists, creates and deletes the bots a session can be
//!   opened with
//!
//! Both are traits so the controller can be driven by stubs in tests;
//! [`HttpRemoteService`] implements them against the chat backend.

mod bots;
mod http;

pub use bots::{resolve_bot, BotDescriptor};
pub use http::HttpRemoteService;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionKind;
use crate::sources::SourceDraft;

/// Embedding model used when none is configured.
pub const DEFAULT_EMBEDDING_MODEL: &str = "open_ai";

/// Model selection sent along with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub embedding_model: String,
    pub app_type: SessionKind,
}

impl ModelConfig {
    pub fn new(embedding_model: impl Into<String>, app_type: SessionKind) -> Self {
        Self {
            embedding_model: embedding_model.into(),
            app_type,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_MODEL, SessionKind::App)
    }
}

/// Successful answer to a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub response: String,
}

/// A failed remote call.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never got a response (connection refused, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("Server returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Answers questions and ingests knowledge sources for a bot.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Ask the bot a question. One round trip per call.
    async fn answer(&self, query: &str, model: &ModelConfig)
        -> Result<AnswerResponse, RemoteError>;

    /// Ask the bot to ingest a source. One round trip per call.
    async fn ingest(&self, draft: &SourceDraft, model: &ModelConfig) -> Result<(), RemoteError>;
}

/// The bots known to the backend.
#[async_trait]
pub trait BotRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<BotDescriptor>, RemoteError>;

    /// Register a bot named `name`. The backend derives its slug the same way
    /// as [`BotDescriptor::slug_for`]; an existing slug is a `Status` error.
    async fn create(&self, name: &str) -> Result<BotDescriptor, RemoteError>;

    /// Remove the bot with `slug`. An unknown slug is a `Status` error.
    async fn delete(&self, slug: &str) -> Result<(), RemoteError>;
}
