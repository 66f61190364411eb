//! End-to-end `generate` pipeline: roster → capture → bind → export → PDF.

use std::time::Instant;

use tracing::{info, instrument};

use ratedeck_capture::{CaptureProgress, CaptureSummary};
use ratedeck_session::RenderSession;
use ratedeck_shared::{AppConfig, EntrySnapshot, GenerationRequest, RenderedDocument, Result};

// ---------------------------------------------------------------------------
// GenerateOutcome
// ---------------------------------------------------------------------------

/// Result of a completed generation request.
#[derive(Debug)]
pub struct GenerateOutcome {
    /// The print-ready PDF payload.
    pub document: RenderedDocument,
    /// Per-entry capture statistics for operational visibility.
    pub capture: CaptureSummary,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each entry's capture resolves.
    fn entry_captured(&self, current: usize, total: usize, display_name: &str);
    /// Called when the pipeline completes.
    fn done(&self, outcome: &GenerateOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn entry_captured(&self, _current: usize, _total: usize, _display_name: &str) {}
    fn done(&self, _outcome: &GenerateOutcome) {}
}

/// Adapts a [`ProgressReporter`] to the capture stage's progress interface.
struct PipelineCaptureProgress<'a> {
    inner: &'a dyn ProgressReporter,
}

impl CaptureProgress for PipelineCaptureProgress<'_> {
    fn entry_finished(&self, current: usize, total: usize, entry: &EntrySnapshot) {
        self.inner.entry_captured(current, total, &entry.display_name);
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full generation pipeline.
///
/// Stages run in strict sequence; each consumes its predecessor's fully
/// materialized output:
/// 1. Capture profile snapshots (per-entry failures degrade to placeholders)
/// 2. Bind the template into compiled markup
/// 3. Export the markup to a paginated PDF
///
/// A bind or export failure aborts the whole request with no partial output.
/// The session is started here if needed but never stopped — its lifecycle
/// belongs to the caller, and it is reused across requests.
#[instrument(skip_all, fields(client = %request.client_label, entries = request.entries.len()))]
pub async fn generate(
    session: &dyn RenderSession,
    config: &AppConfig,
    request: &GenerationRequest,
    progress: &dyn ProgressReporter,
) -> Result<GenerateOutcome> {
    let start = Instant::now();

    info!(
        client = %request.client_label,
        entries = request.entries.len(),
        "starting generation pipeline"
    );

    session.ensure_started().await?;

    // --- Phase 1: Capture ---
    progress.phase("Capturing profile snapshots");
    let capture_progress = PipelineCaptureProgress { inner: progress };
    let (capture_summary, captures) = ratedeck_capture::capture(
        session,
        &config.capture,
        &request.entries,
        &capture_progress,
    )
    .await?;

    // --- Phase 2: Bind ---
    progress.phase("Binding template");
    let markup = ratedeck_template::bind(
        &config.template,
        &request.client_label,
        &request.entries,
        &captures,
    )?;

    // --- Phase 3: Export ---
    progress.phase("Exporting document");
    let document = ratedeck_export::export(session, &config.export, &markup).await?;

    let outcome = GenerateOutcome {
        document,
        capture: capture_summary,
        elapsed: start.elapsed(),
    };

    progress.done(&outcome);

    info!(
        bytes = outcome.document.bytes.len(),
        captured = outcome.capture.captured,
        skipped = outcome.capture.skipped,
        failed = outcome.capture.failed,
        elapsed_ms = outcome.elapsed.as_millis(),
        "generation pipeline complete"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use ratedeck_session::PageContext;
    use ratedeck_shared::{ExportConfig, RatedeckError};

    /// Fake engine covering both capture and export paths. Records the
    /// markup loaded for export so tests can assert on document structure.
    struct FakeSession {
        started: AtomicBool,
        exported_markup: Arc<Mutex<Option<String>>>,
    }

    impl FakeSession {
        fn new() -> Self {
            Self {
                started: AtomicBool::new(false),
                exported_markup: Arc::new(Mutex::new(None)),
            }
        }

        async fn exported_markup(&self) -> Option<String> {
            self.exported_markup.lock().await.clone()
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
            Ok(Box::new(FakePage {
                exported_markup: self.exported_markup.clone(),
            }))
        }

        async fn stop(&self) -> Result<()> {
            self.started.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FakePage {
        exported_markup: Arc<Mutex<Option<String>>>,
    }

    #[async_trait]
    impl PageContext for FakePage {
        async fn set_viewport(&self, _width: u32, _height: u32) -> Result<()> {
            Ok(())
        }

        async fn navigate(&self, url: &str, _timeout: Duration) -> Result<()> {
            if url.contains("unreachable") {
                return Err(RatedeckError::capture(format!("{url}: timed out")));
            }
            Ok(())
        }

        async fn capture_screenshot(&self) -> Result<Vec<u8>> {
            Ok(b"\x89PNG_fake".to_vec())
        }

        async fn set_content(&self, html: &str) -> Result<()> {
            *self.exported_markup.lock().await = Some(html.to_string());
            Ok(())
        }

        async fn print_to_pdf(&self, _opts: &ExportConfig) -> Result<Vec<u8>> {
            Ok(b"%PDF-1.7 fake-document".to_vec())
        }

        async fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    fn fast_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.capture.settle_delay_ms = 0;
        // Point at a non-existent template so the built-in default is used.
        config.template.path = "/nonexistent/ratecard.hbs".into();
        config
    }

    fn entry(id: &str, display_name: &str, urls: &[&str], rate: f64) -> EntrySnapshot {
        EntrySnapshot {
            id: id.into(),
            display_name: display_name.into(),
            profile_urls: urls.iter().map(|s| s.to_string()).collect(),
            rate,
            rate_details: "per post".into(),
            tags: vec!["travel".into()],
        }
    }

    #[tokio::test]
    async fn empty_roster_still_produces_a_document() {
        let session = FakeSession::new();
        let request = GenerationRequest {
            client_label: "Acme".into(),
            entries: vec![],
        };

        let outcome = generate(&session, &fast_config(), &request, &SilentProgress)
            .await
            .expect("generate");

        assert!(outcome.document.is_valid());
        assert!(!outcome.document.bytes.is_empty());
    }

    #[tokio::test]
    async fn end_to_end_mixed_roster() {
        let session = FakeSession::new();
        let request = GenerationRequest {
            client_label: "Acme".into(),
            entries: vec![
                entry("a", "Aisyah Rahman", &["https://instagram.com/aisyah"], 2500.0),
                entry("b", "Ben Ong", &[], 800.0),
            ],
        };

        let outcome = generate(&session, &fast_config(), &request, &SilentProgress)
            .await
            .expect("generate");

        assert!(outcome.document.is_valid());
        assert_eq!(outcome.capture.captured, 1);
        assert_eq!(outcome.capture.skipped, 1);

        let markup = session.exported_markup().await.expect("markup exported");
        // Both entry blocks present, in order.
        let pos_a = markup.find("Aisyah Rahman").expect("entry a rendered");
        let pos_b = markup.find("Ben Ong").expect("entry b rendered");
        assert!(pos_a < pos_b);
        // A carries embedded image data; B gets the placeholder.
        assert_eq!(markup.matches("data:image/png;base64,").count(), 1);
        assert_eq!(markup.matches("Profile preview unavailable").count(), 1);
        // Client label appears exactly once in the header region.
        assert_eq!(markup.matches("<h1>Acme</h1>").count(), 1);
        // Canonical currency formatting.
        assert!(markup.contains("MYR 2,500.00"));
        assert!(markup.contains("MYR 800.00"));
    }

    #[tokio::test]
    async fn capture_failure_degrades_to_placeholder_not_abort() {
        let session = FakeSession::new();
        let request = GenerationRequest {
            client_label: "Acme".into(),
            entries: vec![
                entry("a", "Reachable", &["https://instagram.com/a"], 100.0),
                entry("b", "Broken", &["https://unreachable.example/b"], 200.0),
            ],
        };

        let outcome = generate(&session, &fast_config(), &request, &SilentProgress)
            .await
            .expect("generate must not abort on capture failure");

        assert_eq!(outcome.capture.captured, 1);
        assert_eq!(outcome.capture.failed, 1);

        let markup = session.exported_markup().await.expect("markup exported");
        assert_eq!(markup.matches("Profile preview unavailable").count(), 1);
    }

    #[tokio::test]
    async fn malformed_template_aborts_before_export() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.hbs");
        std::fs::write(&path, "{{#each entries}} unterminated").expect("write");

        let mut config = fast_config();
        config.template.path = path.to_string_lossy().into_owned();

        let session = FakeSession::new();
        let request = GenerationRequest {
            client_label: "Acme".into(),
            entries: vec![],
        };

        let err = generate(&session, &config, &request, &SilentProgress)
            .await
            .err()
            .expect("must fail");
        assert!(matches!(err, RatedeckError::TemplateCompile(_)));
        // Export never ran: no markup reached the engine.
        assert!(session.exported_markup().await.is_none());
    }

    #[tokio::test]
    async fn phases_reported_in_order() {
        struct RecordingProgress(std::sync::Mutex<Vec<String>>);

        impl ProgressReporter for RecordingProgress {
            fn phase(&self, name: &str) {
                self.0.lock().unwrap().push(name.to_string());
            }
            fn entry_captured(&self, _c: usize, _t: usize, _n: &str) {}
            fn done(&self, _o: &GenerateOutcome) {}
        }

        let session = FakeSession::new();
        let request = GenerationRequest {
            client_label: "Acme".into(),
            entries: vec![],
        };
        let progress = RecordingProgress(std::sync::Mutex::new(vec![]));

        generate(&session, &fast_config(), &request, &progress)
            .await
            .expect("generate");

        let phases = progress.0.lock().unwrap().clone();
        assert_eq!(
            phases,
            vec![
                "Capturing profile snapshots",
                "Binding template",
                "Exporting document"
            ]
        );
    }
}
