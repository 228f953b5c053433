//! Bot descriptors and slug resolution.

use serde::{Deserialize, Serialize};

use super::{BotRegistry, RemoteError};

/// A bot as listed by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotDescriptor {
    pub slug: String,
    pub name: String,
}

impl BotDescriptor {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
        }
    }

    /// Derive the slug the registry assigns to a bot name: lower-cased, with
    /// spaces replaced by underscores.
    pub fn slug_for(name: &str) -> String {
        name.to_lowercase().replace(' ', "_")
    }
}

/// Find the descriptor for `slug`.
///
/// `Ok(None)` means the registry answered but knows no such bot; the session
/// is unresolved.
pub async fn resolve_bot(
    registry: &dyn BotRegistry,
    slug: &str,
) -> Result<Option<BotDescriptor>, RemoteError> {
    let bots = registry.list().await?;
    let found = bots.into_iter().find(|bot| bot.slug == slug);
    if found.is_none() {
        log::warn!("No bot registered under slug {slug}");
    }
    Ok(found)
}
