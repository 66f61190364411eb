//! Rendering engine session: a shared, lazily-started headless Chromium
//! process that hands out isolated page contexts.
//!
//! The session is modeled as an owned resource handle ([`RenderSession`])
//! rather than a hidden singleton, so the capture/export stages can run
//! against a fake in tests. [`ChromiumSession`] is the production
//! implementation backed by `chromiumoxide`.

mod chromium;

use std::time::Duration;

use async_trait::async_trait;

use ratedeck_shared::{ExportConfig, Result};

pub use chromium::ChromiumSession;

// ---------------------------------------------------------------------------
// RenderSession
// ---------------------------------------------------------------------------

/// A long-lived rendering engine process that page contexts are borrowed from.
///
/// The session is shared process-wide and reused across generation requests
/// to avoid paying engine startup cost per document. Its lifecycle belongs to
/// the caller (typically the app), not to the pipeline.
#[async_trait]
pub trait RenderSession: Send + Sync {
    /// Start the underlying engine process if not already running.
    ///
    /// Idempotent. Concurrent callers are serialized by a start-state guard;
    /// only the first launches the process.
    async fn ensure_started(&self) -> Result<()>;

    /// Borrow a fresh isolated page context.
    ///
    /// Fails with [`ratedeck_shared::RatedeckError::SessionNotReady`] if the
    /// session has not been started.
    async fn new_page(&self) -> Result<Box<dyn PageContext>>;

    /// Terminate the engine process and release it.
    ///
    /// Idempotent; safe to call when not started.
    async fn stop(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// PageContext
// ---------------------------------------------------------------------------

/// One isolated browsing context borrowed from a [`RenderSession`].
///
/// The borrower is responsible for calling [`PageContext::close`] on every
/// exit path, success or failure.
#[async_trait]
pub trait PageContext: Send {
    /// Fix the viewport size for consistent layout across captures.
    async fn set_viewport(&self, width: u32, height: u32) -> Result<()>;

    /// Navigate to `url` and wait for the page to settle, bounded by a hard
    /// timeout covering both navigation and load.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Capture a full-page PNG snapshot of the current content.
    async fn capture_screenshot(&self) -> Result<Vec<u8>>;

    /// Load markup directly into the context (no network navigation).
    async fn set_content(&self, html: &str) -> Result<()>;

    /// Render the current content to a paginated PDF.
    async fn print_to_pdf(&self, opts: &ExportConfig) -> Result<Vec<u8>>;

    /// Destroy the page context, releasing its engine-side resources.
    async fn close(self: Box<Self>) -> Result<()>;
}
