//! Template binding stage: roster + captures → compiled HTML markup.
//!
//! Loads a Handlebars template (external file if present, built-in default
//! otherwise), binds the [`RenderModel`], and compiles a single markup
//! document for the export stage. Compiled markup is a pure function of the
//! model and the template text; the export stage knows nothing about data
//! binding.

mod model;

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use handlebars::Handlebars;
use tracing::{debug, instrument};

use ratedeck_shared::{CaptureResult, EntrySnapshot, RatedeckError, Result, TemplateConfig};

pub use model::{RenderEntry, RenderModel, build_model, format_currency, format_long_date};

/// Built-in fallback template, used whenever the external file is unreadable.
pub const DEFAULT_TEMPLATE: &str = include_str!("default_template.hbs");

/// Registry name for the single rate-card template.
const TEMPLATE_NAME: &str = "ratecard";

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Bind a request's data into compiled markup.
///
/// Template *absence* is recoverable and falls back to [`DEFAULT_TEMPLATE`];
/// template *malformation* (e.g., an unterminated `{{#each}}` block) is a
/// fatal [`RatedeckError::TemplateCompile`] since no partial document is
/// meaningful.
#[instrument(skip_all, fields(client = %client_label, entries = entries.len()))]
pub fn bind(
    config: &TemplateConfig,
    client_label: &str,
    entries: &[EntrySnapshot],
    captures: &HashMap<String, CaptureResult>,
) -> Result<String> {
    let template = load_template(Path::new(&config.path));
    let model = build_model(
        client_label,
        &config.currency,
        entries,
        captures,
        Utc::now(),
    );
    compile(&template, &model)
}

/// Read the external template, falling back to the built-in default.
/// Never raises: absence is a recoverable condition, not a fault.
fn load_template(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!(?path, "using external template");
            content
        }
        Err(e) => {
            debug!(?path, error = %e, "external template unavailable, using built-in default");
            DEFAULT_TEMPLATE.to_string()
        }
    }
}

/// Compile the template against a render model.
pub fn compile(template: &str, model: &RenderModel) -> Result<String> {
    let mut registry = Handlebars::new();

    registry
        .register_template_string(TEMPLATE_NAME, template)
        .map_err(|e| RatedeckError::TemplateCompile(e.to_string()))?;

    registry
        .render(TEMPLATE_NAME, model)
        .map_err(|e| RatedeckError::TemplateCompile(e.to_string()))
}
