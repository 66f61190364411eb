//! Document export stage: compiled markup → paginated, print-ready PDF.
//!
//! Loads the compiled markup into a fresh page context (no network
//! navigation; snapshot images are already inlined) and prints it to a
//! fixed-page-size PDF with backgrounds enabled. Any failure here is fatal
//! to the request.

use tracing::{debug, info, instrument};

use ratedeck_session::RenderSession;
use ratedeck_shared::{ExportConfig, RatedeckError, RenderedDocument, Result};

/// Render compiled markup to a PDF document.
///
/// The page context is destroyed on every exit path. The returned payload is
/// checked to be recognizably a PDF (non-empty, `%PDF` magic) before it is
/// handed back.
#[instrument(skip_all, fields(markup_len = markup.len()))]
pub async fn export(
    session: &dyn RenderSession,
    config: &ExportConfig,
    markup: &str,
) -> Result<RenderedDocument> {
    let page = match session.new_page().await {
        Ok(page) => page,
        Err(RatedeckError::SessionNotReady) => return Err(RatedeckError::SessionNotReady),
        Err(e) => return Err(RatedeckError::Export(e.to_string())),
    };

    let result = async {
        page.set_content(markup).await?;
        page.print_to_pdf(config).await
    }
    .await;

    // Unconditional release before the outcome is inspected.
    if let Err(e) = page.close().await {
        debug!(error = %e, "page close failed after export");
    }

    let bytes = result?;
    let document = RenderedDocument { bytes };

    if !document.is_valid() {
        return Err(RatedeckError::Export(
            "engine produced an empty or non-PDF payload".into(),
        ));
    }

    info!(bytes = document.bytes.len(), "document exported");
    Ok(document)
}
