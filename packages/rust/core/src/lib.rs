//! Core pipeline orchestration for ratedeck.
//!
//! Ties the capture, template-binding, and export stages into the
//! end-to-end `generate` workflow.

pub mod pipeline;

pub use pipeline::{GenerateOutcome, ProgressReporter, SilentProgress, generate};
