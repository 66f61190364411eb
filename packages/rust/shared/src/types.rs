//! Core domain types for the ratedeck generation pipeline.

use serde::{Deserialize, Serialize};
use url::Url;

// ---------------------------------------------------------------------------
// GenerationRequest
// ---------------------------------------------------------------------------

/// One rate-card generation request: a client label plus the roster entries
/// to include, in presentation order. Owned by a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Client/company label shown in the document header.
    pub client_label: String,
    /// Roster entries, in the order they appear in the document.
    pub entries: Vec<EntrySnapshot>,
}

// ---------------------------------------------------------------------------
// EntrySnapshot
// ---------------------------------------------------------------------------

/// Read-only input view of one roster record. Never mutated by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySnapshot {
    /// Caller-assigned unique identifier.
    pub id: String,
    /// Display name shown on the rate card.
    pub display_name: String,
    /// Public profile URLs in priority order; the first non-empty one is
    /// the screenshot target.
    #[serde(default)]
    pub profile_urls: Vec<String>,
    /// Rate in the configured currency.
    pub rate: f64,
    /// Free-text rate description (e.g., "per sponsored post").
    #[serde(default)]
    pub rate_details: String,
    /// Niche/tag names.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl EntrySnapshot {
    /// The first non-empty profile URL, if any.
    pub fn primary_url(&self) -> Option<&str> {
        self.profile_urls
            .iter()
            .map(|u| u.trim())
            .find(|u| !u.is_empty())
    }

    /// Human platform labels for every non-empty profile URL, in order.
    pub fn platform_labels(&self) -> Vec<String> {
        self.profile_urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(platform_label)
            .collect()
    }
}

/// Derive a human platform label from a profile URL's host.
pub fn platform_label(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .unwrap_or_default();

    let host = host.strip_prefix("www.").unwrap_or(&host);

    match host {
        h if h.ends_with("instagram.com") => "Instagram".into(),
        h if h.ends_with("tiktok.com") => "TikTok".into(),
        h if h.ends_with("youtube.com") || h.ends_with("youtu.be") => "YouTube".into(),
        h if h.ends_with("facebook.com") => "Facebook".into(),
        h if h.ends_with("twitter.com") || h == "x.com" => "X".into(),
        h if h.ends_with("twitch.tv") => "Twitch".into(),
        h if !h.is_empty() => h.to_string(),
        _ => "Web".into(),
    }
}

// ---------------------------------------------------------------------------
// CaptureResult
// ---------------------------------------------------------------------------

/// Outcome of the visual capture stage for one entry.
///
/// `image` holds a PNG data URI suitable for inline embedding, or `None`
/// when the entry had no usable profile URL or its capture failed.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    /// Identifier of the entry this result belongs to.
    pub entry_id: String,
    /// Embeddable snapshot data, or `None` for a placeholder.
    pub image: Option<String>,
}

impl CaptureResult {
    /// An absent result for an entry (no URL, or capture failed).
    pub fn absent(entry_id: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            image: None,
        }
    }
}

// ---------------------------------------------------------------------------
// RenderedDocument
// ---------------------------------------------------------------------------

/// The pipeline's sole output: an opaque print-ready PDF payload.
#[derive(Clone)]
pub struct RenderedDocument {
    /// Raw PDF bytes.
    pub bytes: Vec<u8>,
}

impl RenderedDocument {
    /// PDF magic header expected at the start of a valid payload.
    pub const MAGIC: &'static [u8] = b"%PDF";

    /// Minimal structural validity: non-empty and starts with the PDF magic.
    pub fn is_valid(&self) -> bool {
        self.bytes.starts_with(Self::MAGIC)
    }
}

impl std::fmt::Debug for RenderedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Avoid dumping megabytes of PDF into logs.
        f.debug_struct("RenderedDocument")
            .field("len", &self.bytes.len())
            .finish()
    }
}
