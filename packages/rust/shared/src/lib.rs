//! Shared types, error model, and configuration for ratedeck.
//!
//! This crate is the foundation depended on by all other ratedeck crates.
//! It provides:
//! - [`RatedeckError`] — the unified error type
//! - Domain types ([`GenerationRequest`], [`EntrySnapshot`], [`CaptureResult`], [`RenderedDocument`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CaptureConfig, ExportConfig, TemplateConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{RatedeckError, Result};
pub use types::{
    CaptureResult, EntrySnapshot, GenerationRequest, RenderedDocument, platform_label,
};
