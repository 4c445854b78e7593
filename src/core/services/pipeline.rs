//! Conversion pipeline
//!
//! Runs the stages strictly one after another: select an export, merge split
//! weights when they fit, publish into the live directory, validate what was
//! published. Only strategy exhaustion (or a failed publish) aborts, and
//! both remove the scratch export directory; a failed merge falls back to
//! publishing the split form unchanged.

use std::path::PathBuf;

use log::{info, warn};
use serde::Serialize;

use super::merger::{DEFAULT_MERGE_CEILING_BYTES, ExternalDataMerger, MergeOutcome};
use super::publisher::ArtifactPublisher;
use super::selector::ExportStrategySelector;
use super::validator::{DEFAULT_SCAN_WINDOW_BYTES, IntegrityValidator};
use crate::core::error::PipelineError;
use crate::core::models::{
    ArtifactFile, DEFAULT_DIAGNOSTIC_LIMIT, ExportAttempt, ExportMethod, ExportResult,
    ModelArtifact, PublishedState, SizeExpectation, SourceCheckpoint, ValidationReport,
    expand_attempts,
};
use crate::core::ports::{Exporter, GraphInliner, RuntimeLoader};
use crate::paths;

/// Opset candidates tried by raw export, newest first
pub const DEFAULT_OPSET_CANDIDATES: [u32; 7] = [17, 16, 15, 14, 13, 12, 11];

/// Tunables for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Ordered export attempts
    pub attempts: Vec<ExportAttempt>,
    /// Acceptance gate for exported artifacts; `None` uses the family floor
    pub min_artifact_bytes: Option<u64>,
    /// Merge ceiling
    pub merge_ceiling_bytes: u64,
    /// Graph bytes scanned for external references
    pub scan_window_bytes: usize,
    /// Length bound for library error text
    pub diagnostic_limit: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            attempts: expand_attempts(&ExportMethod::DEFAULT_ORDER, &DEFAULT_OPSET_CANDIDATES),
            min_artifact_bytes: None,
            merge_ceiling_bytes: DEFAULT_MERGE_CEILING_BYTES,
            scan_window_bytes: DEFAULT_SCAN_WINDOW_BYTES,
            diagnostic_limit: DEFAULT_DIAGNOSTIC_LIMIT,
        }
    }
}

/// What to convert and where to put it
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// Source checkpoint
    pub checkpoint: SourceCheckpoint,
    /// Live model directory
    pub dest: PathBuf,
    /// Size expectation used by validation
    pub expectation: SizeExpectation,
}

/// Everything a completed run produced
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Every export result in the order tried, the accepted one last
    pub attempts: Vec<ExportResult>,
    /// The accepted attempt
    pub accepted: ExportAttempt,
    /// Merge outcome, if the export was split
    pub merge: Option<MergeOutcome>,
    /// The published state
    pub published: PublishedState,
    /// Validation of the published directory
    pub validation: ValidationReport,
}

/// Serializable summary of a [`PipelineReport`]'s export stage
#[derive(Debug, Clone, Serialize)]
pub struct AttemptSummary {
    /// Attempt label (e.g. "raw-export (opset 14)")
    pub attempt: String,
    /// Whether it was accepted
    pub success: bool,
    /// Diagnostic message
    pub message: String,
}

impl From<&ExportResult> for AttemptSummary {
    fn from(result: &ExportResult) -> Self {
        Self {
            attempt: result.attempt.to_string(),
            success: result.success,
            message: result.message.clone(),
        }
    }
}

/// Sequential export, merge, publish and validate
pub struct ConversionPipeline<'a> {
    exporter: &'a dyn Exporter,
    inliner: &'a dyn GraphInliner,
    runtime: Option<&'a dyn RuntimeLoader>,
    settings: PipelineSettings,
}

impl std::fmt::Debug for ConversionPipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionPipeline")
            .field("runtime", &self.runtime.is_some())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<'a> ConversionPipeline<'a> {
    /// Create a pipeline over the given ports
    #[must_use]
    pub const fn new(
        exporter: &'a dyn Exporter,
        inliner: &'a dyn GraphInliner,
        runtime: Option<&'a dyn RuntimeLoader>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            exporter,
            inliner,
            runtime,
            settings,
        }
    }

    /// The settings this pipeline runs with
    #[must_use]
    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run every stage for `request`
    pub fn run(&self, request: &PipelineRequest) -> Result<PipelineReport, PipelineError> {
        let checkpoint = &request.checkpoint;
        if !checkpoint.exists() {
            return Err(PipelineError::CheckpointNotFound(checkpoint.dir.clone()));
        }

        let export_dir = paths::export_dir(&request.dest);
        let min_bytes =
            self.settings.min_artifact_bytes.unwrap_or_else(|| checkpoint.family.min_export_bytes());

        info!("Exporting {} ({})", checkpoint.dir.display(), checkpoint.family);
        let selector = ExportStrategySelector::new(self.exporter, min_bytes)
            .with_diagnostic_limit(self.settings.diagnostic_limit);
        let selection = match selector.select(checkpoint, &self.settings.attempts, &export_dir) {
            Ok(selection) => selection,
            Err(e) => {
                discard_export_dir(&export_dir);
                return Err(e);
            },
        };

        let (artifact, merge, merged) = self.consolidate(&selection.artifact, &export_dir);

        let published = match ArtifactPublisher::new()
            .with_companions(paths::companions(&checkpoint.dir))
            .publish(&artifact, merged, &request.dest, std::slice::from_ref(&export_dir))
        {
            Ok(published) => published,
            Err(e) => {
                discard_export_dir(&export_dir);
                return Err(e.into());
            },
        };

        let validator = self
            .runtime
            .map_or_else(IntegrityValidator::without_runtime, IntegrityValidator::new)
            .with_scan_window(self.settings.scan_window_bytes)
            .with_diagnostic_limit(self.settings.diagnostic_limit);
        let validation = validator.validate(&request.dest, &request.expectation);

        if validation.passed() {
            info!("Published artifact passed validation");
        } else {
            warn!("Published artifact failed validation with {} error(s)", validation.errors().len());
        }

        Ok(PipelineReport {
            attempts: selection.history,
            accepted: selection.attempt,
            merge,
            published,
            validation,
        })
    }

    /// Merge a split export; fall back to the split form on any failure
    fn consolidate(
        &self,
        exported: &ModelArtifact,
        export_dir: &std::path::Path,
    ) -> (ModelArtifact, Option<MergeOutcome>, bool) {
        let Some(external) = &exported.external else {
            return (exported.clone(), None, false);
        };

        info!("Export is split; merging external data");
        let target = paths::graph(&paths::merged_dir(export_dir));
        let outcome = ExternalDataMerger::new(self.inliner)
            .with_ceiling(self.settings.merge_ceiling_bytes)
            .with_diagnostic_limit(self.settings.diagnostic_limit)
            .merge(&exported.graph.path, Some(&external.path), &target);

        let merged = outcome
            .merged_path()
            .and_then(|path| ArtifactFile::from_path(path).ok())
            .map(ModelArtifact::single);

        match merged {
            Some(artifact) => (artifact, Some(outcome), true),
            None => {
                info!("Keeping split graph and external data");
                (exported.clone(), Some(outcome), false)
            },
        }
    }
}

fn discard_export_dir(dir: &std::path::Path) {
    if dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(dir) {
            warn!("Cannot remove {}: {e}", dir.display());
        }
    }
}
