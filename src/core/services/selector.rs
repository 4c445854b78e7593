//! Export strategy selector
//!
//! Walks an ordered attempt list against a checkpoint until one attempt
//! produces a plausibly sized artifact. Attempt failures are never fatal;
//! only exhausting the list is.

use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use crate::core::error::PipelineError;
use crate::core::models::{
    DEFAULT_DIAGNOSTIC_LIMIT, ExportAttempt, ExportResult, ModelArtifact, SourceCheckpoint,
    to_mib, truncate_diagnostic,
};
use crate::core::ports::Exporter;

/// The accepted attempt plus everything tried before it
#[derive(Debug, Clone)]
pub struct Selection {
    /// The accepted artifact
    pub artifact: ModelArtifact,
    /// The attempt that produced it
    pub attempt: ExportAttempt,
    /// Every result in the order tried, the accepted one last
    pub history: Vec<ExportResult>,
}

impl Selection {
    /// Failed results that preceded the accepted attempt
    pub fn failures(&self) -> impl Iterator<Item = &ExportResult> {
        self.history.iter().filter(|r| !r.success)
    }
}

/// Drives export attempts in order until one is accepted
#[derive(Clone, Copy)]
pub struct ExportStrategySelector<'a> {
    exporter: &'a dyn Exporter,
    min_artifact_bytes: u64,
    diagnostic_limit: usize,
}

impl std::fmt::Debug for ExportStrategySelector<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportStrategySelector")
            .field("min_artifact_bytes", &self.min_artifact_bytes)
            .field("diagnostic_limit", &self.diagnostic_limit)
            .finish_non_exhaustive()
    }
}

impl<'a> ExportStrategySelector<'a> {
    /// Create a selector whose acceptance gate rejects artifacts of at most
    /// `min_artifact_bytes`.
    #[must_use]
    pub const fn new(exporter: &'a dyn Exporter, min_artifact_bytes: u64) -> Self {
        Self {
            exporter,
            min_artifact_bytes,
            diagnostic_limit: DEFAULT_DIAGNOSTIC_LIMIT,
        }
    }

    /// Bound the length of exporter error text kept per attempt
    #[must_use]
    pub const fn with_diagnostic_limit(mut self, limit: usize) -> Self {
        self.diagnostic_limit = limit;
        self
    }

    /// Try `attempts` in order, exporting into a fresh `out_dir`.
    ///
    /// Returns the first accepted attempt, or
    /// [`PipelineError::StrategiesExhausted`] carrying every diagnostic.
    pub fn select(
        &self,
        checkpoint: &SourceCheckpoint,
        attempts: &[ExportAttempt],
        out_dir: &Path,
    ) -> Result<Selection, PipelineError> {
        if attempts.is_empty() {
            return Err(PipelineError::NoAttempts);
        }

        if out_dir.exists() {
            fs::remove_dir_all(out_dir)?;
        }
        fs::create_dir_all(out_dir)?;

        let mut history = Vec::with_capacity(attempts.len());

        for attempt in attempts {
            info!("Trying {attempt}");
            let result = self.try_attempt(checkpoint, attempt, out_dir);

            if let (true, Some(artifact)) = (result.success, result.artifact.clone()) {
                info!("Accepted {attempt}: {}", result.message);
                history.push(result);
                return Ok(Selection {
                    artifact,
                    attempt: *attempt,
                    history,
                });
            }

            warn!("{attempt} failed: {}", result.message);
            discard_partial_output(out_dir);
            history.push(result);
        }

        Err(PipelineError::StrategiesExhausted { attempts: history })
    }

    fn try_attempt(
        &self,
        checkpoint: &SourceCheckpoint,
        attempt: &ExportAttempt,
        out_dir: &Path,
    ) -> ExportResult {
        if let Err(e) = self.exporter.export(checkpoint, attempt, out_dir) {
            return ExportResult::failed(
                *attempt,
                truncate_diagnostic(&format!("{e:#}"), self.diagnostic_limit),
            );
        }

        match ModelArtifact::discover(out_dir) {
            Ok(Some(artifact)) if artifact.total_bytes() > self.min_artifact_bytes => {
                let message = format!(
                    "exported {:.1} MiB{}",
                    to_mib(artifact.total_bytes()),
                    if artifact.is_split() { " (graph + external data)" } else { "" }
                );
                ExportResult::succeeded(*attempt, artifact, message)
            },
            Ok(Some(artifact)) => ExportResult::failed(
                *attempt,
                format!(
                    "output too small ({:.1} MiB, need more than {:.1} MiB); treating as truncated",
                    to_mib(artifact.total_bytes()),
                    to_mib(self.min_artifact_bytes)
                ),
            ),
            Ok(None) => ExportResult::failed(*attempt, "exporter finished but produced no model.onnx"),
            Err(e) => ExportResult::failed(
                *attempt,
                truncate_diagnostic(&format!("cannot inspect export output: {e}"), self.diagnostic_limit),
            ),
        }
    }
}

/// Remove whatever a failed attempt left behind, keeping `out_dir` itself
fn discard_partial_output(out_dir: &Path) {
    let entries = match fs::read_dir(out_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot clean {}: {e}", out_dir.display());
            return;
        },
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let removed = if path.is_dir() { fs::remove_dir_all(&path) } else { fs::remove_file(&path) };
        match removed {
            Ok(()) => debug!("Removed partial output {}", path.display()),
            Err(e) => warn!("Cannot remove partial output {}: {e}", path.display()),
        }
    }
}
