//! Exporter port
//!
//! Defines the interface for running a single export attempt.

use std::path::Path;

use crate::core::models::{ExportAttempt, SourceCheckpoint};

/// Produces an exported artifact from a checkpoint.
///
/// One call is one attempt. Implementations write whatever files they produce
/// under `out_dir`; the selector locates and judges them afterwards.
pub trait Exporter {
    /// Run `attempt` against `checkpoint`, writing into `out_dir`.
    ///
    /// Any error means the attempt failed. Blocks until the export finishes.
    fn export(
        &self,
        checkpoint: &SourceCheckpoint,
        attempt: &ExportAttempt,
        out_dir: &Path,
    ) -> anyhow::Result<()>;
}
