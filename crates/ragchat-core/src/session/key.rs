//! Session identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of app a session talks to.
///
/// Wire names never contain `_`; [`SessionKey::storage_id`] relies on that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    #[default]
    App,
}

impl SessionKind {
    pub const ALL: &'static [SessionKind] = &[SessionKind::App];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::App => "app",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown session kind: {s}"))
    }
}

/// Prefix shared by every transcript slot in durable storage.
pub(crate) const STORAGE_PREFIX: &str = "chat_";

/// Identifies one transcript: a bot plus the kind of session held with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
    bot_slug: String,
    kind: SessionKind,
}

impl SessionKey {
    pub fn new(bot_slug: impl Into<String>, kind: SessionKind) -> Self {
        Self {
            bot_slug: bot_slug.into(),
            kind,
        }
    }

    /// Key for the default `app` session with a bot.
    pub fn app(bot_slug: impl Into<String>) -> Self {
        Self::new(bot_slug, SessionKind::App)
    }

    pub fn bot_slug(&self) -> &str {
        &self.bot_slug
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// The durable storage slot for this session: `chat_{bot_slug}_{kind}`.
    ///
    /// The kind is always the text after the last `_`, so distinct keys never
    /// share a slot even when the slug itself contains underscores.
    pub fn storage_id(&self) -> String {
        format!("{STORAGE_PREFIX}{}_{}", self.bot_slug, self.kind)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bot_slug, self.kind)
    }
}
