//! Knowledge sources a bot can be asked to ingest.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The type of a knowledge source. Serialized with the backend's names
/// (`youtube_video`, `pdf_file`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    YoutubeVideo,
    PdfFile,
    WebPage,
    DocFile,
    Sitemap,
    Text,
}

impl SourceKind {
    /// Every kind, in menu order.
    pub const ALL: [SourceKind; 6] = [
        SourceKind::YoutubeVideo,
        SourceKind::PdfFile,
        SourceKind::WebPage,
        SourceKind::DocFile,
        SourceKind::Sitemap,
        SourceKind::Text,
    ];

    /// Backend name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::YoutubeVideo => "youtube_video",
            SourceKind::PdfFile => "pdf_file",
            SourceKind::WebPage => "web_page",
            SourceKind::DocFile => "doc_file",
            SourceKind::Sitemap => "sitemap",
            SourceKind::Text => "text",
        }
    }

    /// Human-readable label shown in the transcript.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::YoutubeVideo => "YouTube Video",
            SourceKind::PdfFile => "PDF File",
            SourceKind::WebPage => "Web Page",
            SourceKind::DocFile => "Doc File",
            SourceKind::Sitemap => "Sitemap",
            SourceKind::Text => "Text",
        }
    }

    /// Message posted once ingestion succeeded.
    pub fn success_message(&self) -> String {
        format!("Successfully added {}!", self.label())
    }

    /// Message posted when ingestion failed.
    pub fn failure_message(&self) -> String {
        format!("Failed to add {}. Please try again.", self.label())
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    /// Accepts backend names and the short forms `video`, `pdf`, `webpage`,
    /// `web`, `doc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let kind = match normalized.as_str() {
            "youtube_video" | "video" | "youtube" => SourceKind::YoutubeVideo,
            "pdf_file" | "pdf" => SourceKind::PdfFile,
            "web_page" | "webpage" | "web" => SourceKind::WebPage,
            "doc_file" | "doc" | "docx" => SourceKind::DocFile,
            "sitemap" => SourceKind::Sitemap,
            "text" => SourceKind::Text,
            _ => return Err(format!("Unknown source kind: {s}")),
        };
        Ok(kind)
    }
}

/// A source the user is about to submit. Lives for one add-source workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDraft {
    pub kind: SourceKind,
    /// URL, file path, or raw text, depending on the kind.
    pub locator: String,
}

impl SourceDraft {
    pub fn new(kind: SourceKind, locator: impl Into<String>) -> Self {
        Self {
            kind,
            locator: locator.into(),
        }
    }

    /// Whether there is anything to submit.
    pub fn is_blank(&self) -> bool {
        self.locator.trim().is_empty()
    }

    /// Message posted when the ingestion request goes out.
    pub fn announce_message(&self) -> String {
        format!("Adding the following {}: {}", self.kind.label(), self.locator)
    }
}
