//! HTTP transport for the chat backend.
//!
//! # Endpoints
//!
//! ```text
//! POST /api/get_answer   {query, embedding_model, app_type}  -> {response}
//! POST /api/add_sources  {embedding_model, name, value}      -> any 2xx
//! GET  /api/get_bots                                         -> [{name, slug}]
//! POST /api/create_bot   {name}                              -> any 2xx
//! POST /api/delete_bot   {slug}                              -> any 2xx
//! ```
//!
//! ureq is blocking, so every call runs on tokio's blocking pool.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{AnswerResponse, BotDescriptor, BotRegistry, ModelConfig, RemoteError, RemoteService};
use crate::sources::SourceDraft;

/// Talks to the chat backend over HTTP.
#[derive(Clone)]
pub struct HttpRemoteService {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpRemoteService {
    /// Create a client for `base_url` (e.g. `http://localhost:8000`).
    ///
    /// `timeout` bounds each whole request; answers from a large index can be
    /// slow, so callers usually pass minutes rather than seconds.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { base_url, agent }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Request body for `/api/get_answer`.
pub(crate) fn answer_body(query: &str, model: &ModelConfig) -> Value {
    json!({
        "query": query,
        "embedding_model": model.embedding_model,
        "app_type": model.app_type,
    })
}

/// Request body for `/api/add_sources`.
pub(crate) fn ingest_body(draft: &SourceDraft, model: &ModelConfig) -> Value {
    json!({
        "embedding_model": model.embedding_model,
        "name": draft.kind,
        "value": draft.locator,
    })
}

/// Request body for `/api/create_bot`.
pub(crate) fn create_bot_body(name: &str) -> Value {
    json!({ "name": name })
}

/// Request body for `/api/delete_bot`.
pub(crate) fn delete_bot_body(slug: &str) -> Value {
    json!({ "slug": slug })
}

fn map_ureq_error(err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            RemoteError::Status { status, body }
        }
        ureq::Error::Transport(transport) => RemoteError::Transport(transport.to_string()),
    }
}

async fn run_blocking<T, F>(call: F) -> Result<T, RemoteError>
where
    F: FnOnce() -> Result<T, RemoteError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| RemoteError::Transport(format!("Request task failed: {e}")))?
}

/// POST `body` to `url`, ignoring the response body.
async fn post_json(agent: ureq::Agent, url: String, body: Value) -> Result<(), RemoteError> {
    run_blocking(move || {
        agent.post(&url).send_json(body).map_err(map_ureq_error)?;
        Ok(())
    })
    .await
}

#[async_trait]
impl RemoteService for HttpRemoteService {
    async fn answer(
        &self,
        query: &str,
        model: &ModelConfig,
    ) -> Result<AnswerResponse, RemoteError> {
        let agent = self.agent.clone();
        let url = self.endpoint("/api/get_answer");
        let body = answer_body(query, model);

        log::debug!("POST {url}");
        run_blocking(move || {
            let response = agent.post(&url).send_json(body).map_err(map_ureq_error)?;
            response
                .into_json::<AnswerResponse>()
                .map_err(|e| RemoteError::Decode(e.to_string()))
        })
        .await
    }

    async fn ingest(&self, draft: &SourceDraft, model: &ModelConfig) -> Result<(), RemoteError> {
        let url = self.endpoint("/api/add_sources");
        let body = ingest_body(draft, model);

        log::debug!("POST {url} ({})", draft.kind);
        post_json(self.agent.clone(), url, body).await
    }
}

#[async_trait]
impl BotRegistry for HttpRemoteService {
    async fn list(&self) -> Result<Vec<BotDescriptor>, RemoteError> {
        let agent = self.agent.clone();
        let url = self.endpoint("/api/get_bots");

        log::debug!("GET {url}");
        run_blocking(move || {
            let response = agent.get(&url).call().map_err(map_ureq_error)?;
            response
                .into_json::<Vec<BotDescriptor>>()
                .map_err(|e| RemoteError::Decode(e.to_string()))
        })
        .await
    }

    async fn create(&self, name: &str) -> Result<BotDescriptor, RemoteError> {
        let url = self.endpoint("/api/create_bot");

        log::debug!("POST {url} ({name})");
        post_json(self.agent.clone(), url, create_bot_body(name)).await?;

        let bot = BotDescriptor::new(BotDescriptor::slug_for(name), name);
        log::info!("Created bot {} ({})", bot.name, bot.slug);
        Ok(bot)
    }

    async fn delete(&self, slug: &str) -> Result<(), RemoteError> {
        let url = self.endpoint("/api/delete_bot");

        log::debug!("POST {url} ({slug})");
        post_json(self.agent.clone(), url, delete_bot_body(slug)).await?;
        log::info!("Deleted bot {slug}");
        Ok(())
    }
}
