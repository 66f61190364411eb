//! Error types for ratedeck.
//!
//! Library crates use [`RatedeckError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ratedeck operations.
#[derive(Debug, thiserror::Error)]
pub enum RatedeckError {
    /// The rendering engine process failed to launch.
    #[error("engine start error: {0}")]
    EngineStart(String),

    /// A page context was requested before the session was started.
    /// Indicates an orchestration bug, not an environment problem.
    #[error("session not ready: call ensure_started() before new_page()")]
    SessionNotReady,

    /// Per-entry capture failure (navigation timeout, DNS, page crash).
    /// Absorbed inside the capture stage; never surfaced from `generate()`.
    #[error("capture error: {0}")]
    Capture(String),

    /// Template compilation or rendering failure. Fatal to the request.
    #[error("template compile error: {0}")]
    TemplateCompile(String),

    /// Rendering-engine failure during document export. Fatal to the request.
    #[error("export error: {0}")]
    Export(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RatedeckError>;

impl RatedeckError {
    /// Create a capture error from any displayable message.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
