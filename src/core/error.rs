//! Pipeline errors
//!
//! Only exhaustion of every export strategy is an unrecoverable outcome of
//! the conversion itself. Merge and runtime-load failures degrade into
//! report entries and never surface here.

use std::path::PathBuf;

use thiserror::Error;

use super::models::ExportResult;

/// Errors that abort a conversion
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Checkpoint directory does not exist
    #[error("checkpoint directory does not exist: {0}")]
    CheckpointNotFound(PathBuf),

    /// No export attempts were configured
    #[error("no export attempts configured")]
    NoAttempts,

    /// Every export attempt failed
    #[error("all {} export attempts failed", .attempts.len())]
    StrategiesExhausted {
        /// Per-attempt diagnostics, in the order they were tried
        attempts: Vec<ExportResult>,
    },

    /// IO error while preparing scratch directories
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Publishing the artifact failed
    #[error(transparent)]
    Publish(#[from] anyhow::Error),
}

impl PipelineError {
    /// Per-attempt diagnostics, if this is an exhaustion error
    #[must_use]
    pub fn attempts(&self) -> &[ExportResult] {
        match self {
            Self::StrategiesExhausted { attempts } => attempts,
            _ => &[],
        }
    }
}
