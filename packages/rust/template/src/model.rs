//! View model construction and value formatting for the rate-card template.

use chrono::{DateTime, Utc};
use serde::Serialize;

use std::collections::HashMap;

use ratedeck_shared::{CaptureResult, EntrySnapshot};

// ---------------------------------------------------------------------------
// RenderModel
// ---------------------------------------------------------------------------

/// The bound view passed to the template compiler.
#[derive(Debug, Clone, Serialize)]
pub struct RenderModel {
    /// Client/company label for the document header.
    pub client_label: String,
    /// Long-format generation date (e.g., "30 August 2026").
    pub generated_date: String,
    /// One block per roster entry, in request order.
    pub entries: Vec<RenderEntry>,
}

/// One entry block in the render model.
#[derive(Debug, Clone, Serialize)]
pub struct RenderEntry {
    /// Display name of the creator.
    pub display_name: String,
    /// Human platform labels derived from the entry's non-empty URLs.
    pub platforms: Vec<String>,
    /// Niche/tag names.
    pub tags: Vec<String>,
    /// Localized currency text (e.g., "MYR 2,500.00").
    pub formatted_rate: String,
    /// Free-text rate description.
    pub rate_details: String,
    /// PNG data URI, or `None` to render the placeholder block.
    pub image: Option<String>,
}

/// Build the render model for a request.
///
/// Entry order and count always match the input roster; captures are looked
/// up by entry id and missing or absent captures become placeholders.
pub fn build_model(
    client_label: &str,
    currency: &str,
    entries: &[EntrySnapshot],
    captures: &HashMap<String, CaptureResult>,
    generated_at: DateTime<Utc>,
) -> RenderModel {
    let entries = entries
        .iter()
        .map(|entry| RenderEntry {
            display_name: entry.display_name.clone(),
            platforms: entry.platform_labels(),
            tags: entry.tags.clone(),
            formatted_rate: format_currency(currency, entry.rate),
            rate_details: entry.rate_details.clone(),
            image: captures.get(&entry.id).and_then(|c| c.image.clone()),
        })
        .collect();

    RenderModel {
        client_label: client_label.to_string(),
        generated_date: format_long_date(generated_at),
        entries,
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Format a rate as `<CODE> <grouped amount>.<2dp>`, e.g. `MYR 2,500.00`.
pub fn format_currency(code: &str, amount: f64) -> String {
    let negative = amount < 0.0;
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{code} {sign}{grouped}.{frac_part}")
}

/// Long-format date, day first: "30 August 2026".
pub fn format_long_date(date: DateTime<Utc>) -> String {
    date.format("%-d %B %Y").to_string()
}
