//! Transcript entries and the stored snapshot format.

use serde::{Deserialize, Serialize};

/// Who wrote a chat entry. Stored as `"H"` / `"B"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "H")]
    Human,
    #[serde(rename = "B")]
    Bot,
}

/// One item of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub sender: Sender,
    pub message: String,
}

impl ChatEntry {
    pub fn new(sender: Sender, message: impl Into<String>) -> Self {
        Self {
            sender,
            message: message.into(),
        }
    }

    pub fn human(message: impl Into<String>) -> Self {
        Self::new(Sender::Human, message)
    }

    pub fn bot(message: impl Into<String>) -> Self {
        Self::new(Sender::Bot, message)
    }
}

/// Entries in append order. Insertion order is the only order.
pub type Transcript = Vec<ChatEntry>;

/// The value written to durable storage: `{"chats": [...]}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StoredTranscript {
    #[serde(default)]
    pub chats: Transcript,
}

#[derive(Serialize)]
pub(crate) struct StoredTranscriptRef<'a> {
    pub chats: &'a [ChatEntry],
}

pub(crate) fn encode(entries: &[ChatEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&StoredTranscriptRef { chats: entries })
}

pub(crate) fn decode(raw: &str) -> Result<Transcript, serde_json::Error> {
    serde_json::from_str::<StoredTranscript>(raw).map(|stored| stored.chats)
}
