//! Visual capture stage: per-entry profile screenshots.
//!
//! For each roster entry this stage borrows a fresh page context from the
//! shared render session, navigates to the entry's primary profile URL under
//! a hard timeout, waits a fixed settle delay for client-rendered content,
//! and captures a full-page snapshot as an embeddable data URI.
//!
//! Partial data availability must never block document production: any
//! per-entry failure is logged and recorded as an absent snapshot, and the
//! batch continues.

use std::collections::HashMap;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, info, instrument, warn};

use ratedeck_session::{PageContext, RenderSession};
use ratedeck_shared::{CaptureConfig, CaptureResult, EntrySnapshot, RatedeckError, Result};

// ---------------------------------------------------------------------------
// CaptureSummary
// ---------------------------------------------------------------------------

/// Summary of a completed capture pass over a roster.
#[derive(Debug, Clone)]
pub struct CaptureSummary {
    /// Entries with a successful snapshot.
    pub captured: usize,
    /// Entries skipped because they had no usable profile URL.
    pub skipped: usize,
    /// Entries whose capture failed (recorded as absent).
    pub failed: usize,
    /// Failures encountered (entry id, error message).
    pub errors: Vec<(String, String)>,
    /// Total duration of the pass.
    pub duration: Duration,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Per-entry progress hook for interactive frontends.
pub trait CaptureProgress: Send + Sync {
    /// Called before an entry's capture is attempted.
    fn entry_started(&self, _current: usize, _total: usize, _entry: &EntrySnapshot) {}
    /// Called after an entry's capture resolved (snapshot or absent).
    fn entry_finished(&self, _current: usize, _total: usize, _entry: &EntrySnapshot) {}
}

/// No-op progress hook for headless/test usage.
pub struct SilentCapture;

impl CaptureProgress for SilentCapture {}

// ---------------------------------------------------------------------------
// Capture pass
// ---------------------------------------------------------------------------

/// Capture profile snapshots for every entry, one at a time.
///
/// Entries are processed sequentially: the session is shared process-wide,
/// and uncontrolled parallel page contexts against third-party sites risk
/// resource exhaustion and timeout interference.
///
/// Returns one [`CaptureResult`] per entry, keyed by entry id. Only a
/// [`RatedeckError::SessionNotReady`] escapes this function — that is an
/// orchestration bug, not a page failure.
#[instrument(skip_all, fields(entries = entries.len()))]
pub async fn capture(
    session: &dyn RenderSession,
    config: &CaptureConfig,
    entries: &[EntrySnapshot],
    progress: &dyn CaptureProgress,
) -> Result<(CaptureSummary, HashMap<String, CaptureResult>)> {
    let start = std::time::Instant::now();
    let total = entries.len();

    let mut results: HashMap<String, CaptureResult> = HashMap::with_capacity(total);
    let mut errors: Vec<(String, String)> = Vec::new();
    let mut captured = 0usize;
    let mut skipped = 0usize;

    for (i, entry) in entries.iter().enumerate() {
        progress.entry_started(i + 1, total, entry);

        let Some(url) = entry.primary_url() else {
            // No navigation side effect for URL-less entries.
            debug!(entry_id = %entry.id, "no profile URL, recording absent");
            skipped += 1;
            results.insert(entry.id.clone(), CaptureResult::absent(&entry.id));
            progress.entry_finished(i + 1, total, entry);
            continue;
        };

        match capture_one(session, config, url).await {
            Ok(image) => {
                captured += 1;
                results.insert(
                    entry.id.clone(),
                    CaptureResult {
                        entry_id: entry.id.clone(),
                        image: Some(image),
                    },
                );
            }
            // An unstarted session would fail every entry the same way;
            // surface it instead of silently producing a blank document.
            Err(RatedeckError::SessionNotReady) => return Err(RatedeckError::SessionNotReady),
            Err(e) => {
                warn!(entry_id = %entry.id, %url, error = %e, "capture failed, recording absent");
                errors.push((entry.id.clone(), e.to_string()));
                results.insert(entry.id.clone(), CaptureResult::absent(&entry.id));
            }
        }

        progress.entry_finished(i + 1, total, entry);
    }

    let summary = CaptureSummary {
        captured,
        skipped,
        failed: errors.len(),
        errors,
        duration: start.elapsed(),
    };

    info!(
        captured = summary.captured,
        skipped = summary.skipped,
        failed = summary.failed,
        duration_ms = summary.duration.as_millis(),
        "capture pass complete"
    );

    Ok((summary, results))
}

/// Capture one profile page into a PNG data URI.
///
/// The page context is closed on every exit path.
async fn capture_one(
    session: &dyn RenderSession,
    config: &CaptureConfig,
    url: &str,
) -> Result<String> {
    let page = session.new_page().await?;

    let result = capture_with_page(page.as_ref(), config, url).await;

    // Unconditional release; a close failure must not mask the capture result.
    if let Err(e) = page.close().await {
        debug!(%url, error = %e, "page close failed after capture");
    }

    result
}

async fn capture_with_page(
    page: &dyn PageContext,
    config: &CaptureConfig,
    url: &str,
) -> Result<String> {
    page.set_viewport(config.viewport_width, config.viewport_height)
        .await?;

    page.navigate(url, Duration::from_secs(config.navigation_timeout_secs))
        .await?;

    // Profile pages draw client-side after load with no readiness signal;
    // a fixed delay bounds the wait.
    if config.settle_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(config.settle_delay_ms)).await;
    }

    let png = page.capture_screenshot().await?;
    debug!(%url, bytes = png.len(), "snapshot captured");

    Ok(format!("data:image/png;base64,{}", BASE64.encode(&png)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use ratedeck_shared::ExportConfig;

    // -----------------------------------------------------------------------
    // Fakes
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct Counters {
        pages_opened: AtomicUsize,
        pages_closed: AtomicUsize,
        navigations: AtomicUsize,
    }

    struct FakeSession {
        counters: Arc<Counters>,
        started: std::sync::atomic::AtomicBool,
    }

    impl FakeSession {
        fn started() -> Self {
            Self {
                counters: Arc::new(Counters::default()),
                started: std::sync::atomic::AtomicBool::new(true),
            }
        }

        fn unstarted() -> Self {
            Self {
                counters: Arc::new(Counters::default()),
                started: std::sync::atomic::AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl RenderSession for FakeSession {
        async fn ensure_started(&self) -> Result<()> {
            self.started.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn new_page(&self) -> Result<Box<dyn PageContext>> {
            if !self.started.load(Ordering::SeqCst) {
                return Err(RatedeckError::SessionNotReady);
            }
            self.counters.pages_opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakePage {
                counters: self.counters.clone(),
            }))
        }

        async fn stop(&self) -> Result<()> {
            Ok(())
        }
    }

    struct FakePage {
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl PageContext for FakePage {
        async fn set_viewport(&self, _width: u32, _height: u32) -> Result<()> {
            Ok(())
        }

        async fn navigate(&self, url: &str, _timeout: Duration) -> Result<()> {
            self.counters.navigations.fetch_add(1, Ordering::SeqCst);
            if url.contains("unreachable") {
                return Err(RatedeckError::capture(format!("{url}: DNS failure")));
            }
            Ok(())
        }

        async fn capture_screenshot(&self) -> Result<Vec<u8>> {
            Ok(b"\x89PNG_fake".to_vec())
        }

        async fn set_content(&self, _html: &str) -> Result<()> {
            panic!("capture stage must not load markup");
        }

        async fn print_to_pdf(&self, _opts: &ExportConfig) -> Result<Vec<u8>> {
            panic!("capture stage must not export");
        }

        async fn close(self: Box<Self>) -> Result<()> {
            self.counters.pages_closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn entry(id: &str, urls: &[&str]) -> EntrySnapshot {
        EntrySnapshot {
            id: id.into(),
            display_name: format!("Creator {id}"),
            profile_urls: urls.iter().map(|s| s.to_string()).collect(),
            rate: 100.0,
            rate_details: String::new(),
            tags: vec![],
        }
    }

    fn fast_config() -> CaptureConfig {
        CaptureConfig {
            settle_delay_ms: 0,
            navigation_timeout_secs: 5,
            ..CaptureConfig::default()
        }
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn url_less_entries_skip_navigation() {
        let session = FakeSession::started();
        let entries = vec![entry("a", &[]), entry("b", &["", "  "])];

        let (summary, results) = capture(&session, &fast_config(), &entries, &SilentCapture)
            .await
            .expect("capture");

        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.captured, 0);
        assert!(results["a"].image.is_none());
        assert!(results["b"].image.is_none());
        // No page context or navigation side effect for URL-less entries.
        assert_eq!(session.counters.navigations.load(Ordering::SeqCst), 0);
        assert_eq!(session.counters.pages_opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_other_entries() {
        let session = FakeSession::started();
        let entries = vec![
            entry("a", &["https://instagram.com/a"]),
            entry("b", &["https://unreachable.example/b"]),
            entry("c", &["https://tiktok.com/@c"]),
        ];

        let (summary, results) = capture(&session, &fast_config(), &entries, &SilentCapture)
            .await
            .expect("capture");

        assert_eq!(summary.captured, 2);
        assert_eq!(summary.failed, 1);
        assert!(results["a"].image.is_some());
        assert!(results["b"].image.is_none());
        assert!(results["c"].image.is_some());
        assert_eq!(summary.errors[0].0, "b");
    }

    #[tokio::test]
    async fn every_opened_page_is_closed() {
        let session = FakeSession::started();
        let entries = vec![
            entry("a", &["https://instagram.com/a"]),
            entry("b", &["https://unreachable.example/b"]),
        ];

        capture(&session, &fast_config(), &entries, &SilentCapture)
            .await
            .expect("capture");

        let opened = session.counters.pages_opened.load(Ordering::SeqCst);
        let closed = session.counters.pages_closed.load(Ordering::SeqCst);
        assert_eq!(opened, 2);
        assert_eq!(opened, closed);
    }

    #[tokio::test]
    async fn snapshot_is_a_png_data_uri() {
        let session = FakeSession::started();
        let entries = vec![entry("a", &["https://instagram.com/a"])];

        let (_, results) = capture(&session, &fast_config(), &entries, &SilentCapture)
            .await
            .expect("capture");

        let image = results["a"].image.as_deref().expect("image present");
        assert!(image.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn unstarted_session_surfaces_as_not_ready() {
        let session = FakeSession::unstarted();
        let entries = vec![entry("a", &["https://instagram.com/a"])];

        let err = capture(&session, &fast_config(), &entries, &SilentCapture)
            .await
            .err()
            .expect("must fail");
        assert!(matches!(err, RatedeckError::SessionNotReady));
    }

    #[tokio::test]
    async fn empty_roster_yields_empty_map() {
        let session = FakeSession::started();
        let (summary, results) = capture(&session, &fast_config(), &[], &SilentCapture)
            .await
            .expect("capture");

        assert!(results.is_empty());
        assert_eq!(summary.captured + summary.skipped + summary.failed, 0);
    }
}
