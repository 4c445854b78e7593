//! External data merger
//!
//! Consolidates a graph + external weight blob into one inlined file when the
//! result fits the serializer's 2 GiB ceiling. Refuses up front above a
//! safety margin instead of attempting an expensive doomed merge. Never
//! raises past its boundary: any failure means "keep the split form".

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::Regex;
use serde::Serialize;

use crate::core::models::{DEFAULT_DIAGNOSTIC_LIMIT, MIB, to_mib, truncate_diagnostic};
use crate::core::ports::GraphInliner;

/// Largest combined size the merger will try to inline (1900 MiB)
pub const DEFAULT_MERGE_CEILING_BYTES: u64 = 1900 * MIB;

/// Hard limit of an inlined artifact in the target serialization format
pub const SERIALIZER_LIMIT_BYTES: u64 = 2048 * MIB;

static SIZE_LIMIT_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)2\s?gi?b|protobuf").expect("size limit pattern is valid")
});

/// Outcome of a merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum MergeOutcome {
    /// The inlined single file was written to `path`
    Merged {
        /// Location of the inlined graph
        path: PathBuf,
        /// Its size in bytes
        bytes: u64,
    },
    /// Combined size is above the ceiling; the serializer was not invoked
    SkippedTooLarge {
        /// Graph plus external data, in bytes
        combined_bytes: u64,
        /// Configured ceiling, in bytes
        ceiling_bytes: u64,
    },
    /// The serializer reported that the result exceeds its size limit
    TooLarge {
        /// Bounded serializer message
        reason: String,
    },
    /// Loading or serializing failed for another reason
    Failed {
        /// Bounded failure message
        reason: String,
    },
}

impl MergeOutcome {
    /// Whether a single inlined file was produced
    #[must_use]
    pub const fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }

    /// Location of the merged file, if any
    #[must_use]
    pub fn merged_path(&self) -> Option<&Path> {
        match self {
            Self::Merged { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Whether a split artifact of these sizes may be inlined
#[must_use]
pub const fn within_ceiling(graph_bytes: u64, external_bytes: u64, ceiling_bytes: u64) -> bool {
    graph_bytes.saturating_add(external_bytes) <= ceiling_bytes
}

/// Merges external weights into the graph file
#[derive(Clone, Copy)]
pub struct ExternalDataMerger<'a> {
    inliner: &'a dyn GraphInliner,
    ceiling_bytes: u64,
    diagnostic_limit: usize,
}

impl std::fmt::Debug for ExternalDataMerger<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalDataMerger")
            .field("ceiling_bytes", &self.ceiling_bytes)
            .field("diagnostic_limit", &self.diagnostic_limit)
            .finish_non_exhaustive()
    }
}

impl<'a> ExternalDataMerger<'a> {
    /// Create a merger with the default 1900 MiB ceiling
    #[must_use]
    pub const fn new(inliner: &'a dyn GraphInliner) -> Self {
        Self {
            inliner,
            ceiling_bytes: DEFAULT_MERGE_CEILING_BYTES,
            diagnostic_limit: DEFAULT_DIAGNOSTIC_LIMIT,
        }
    }

    /// Override the ceiling
    #[must_use]
    pub const fn with_ceiling(mut self, ceiling_bytes: u64) -> Self {
        self.ceiling_bytes = ceiling_bytes;
        self
    }

    /// Bound the length of serializer error text kept in the outcome
    #[must_use]
    pub const fn with_diagnostic_limit(mut self, limit: usize) -> Self {
        self.diagnostic_limit = limit;
        self
    }

    /// Inline `graph` and `external` into a single file at `target`.
    ///
    /// The file at `target` only appears if the whole merge succeeded. The
    /// caller owns deleting the now-redundant external blob.
    pub fn merge(&self, graph: &Path, external: Option<&Path>, target: &Path) -> MergeOutcome {
        let graph_bytes = match fs::metadata(graph) {
            Ok(meta) => meta.len(),
            Err(e) => return self.failed(&format!("cannot stat {}: {e}", graph.display())),
        };
        let external_bytes = match external.map(fs::metadata).transpose() {
            Ok(meta) => meta.map_or(0, |m| m.len()),
            Err(e) => return self.failed(&format!("cannot stat external data: {e}")),
        };

        let combined_bytes = graph_bytes.saturating_add(external_bytes);
        debug!(
            "Merge candidate: graph {:.1} MiB + external {:.1} MiB",
            to_mib(graph_bytes),
            to_mib(external_bytes)
        );

        if !within_ceiling(graph_bytes, external_bytes, self.ceiling_bytes) {
            info!(
                "Model is {:.1} MiB, above the {:.0} MiB merge ceiling; keeping split files",
                to_mib(combined_bytes),
                to_mib(self.ceiling_bytes)
            );
            return MergeOutcome::SkippedTooLarge {
                combined_bytes,
                ceiling_bytes: self.ceiling_bytes,
            };
        }

        let partial = partial_path(target);
        if let Some(parent) = target.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                return self.failed(&format!("cannot create {}: {e}", parent.display()));
            }
        }

        let outcome = self.inline_into(graph, &partial, target);
        if !outcome.is_merged() && partial.exists() {
            if let Err(e) = fs::remove_file(&partial) {
                warn!("Cannot remove partial merge output {}: {e}", partial.display());
            }
        }
        outcome
    }

    fn inline_into(&self, graph: &Path, partial: &Path, target: &Path) -> MergeOutcome {
        if let Err(e) = self.inliner.inline(graph, partial) {
            let message = format!("{e:#}");
            return if SIZE_LIMIT_ERROR.is_match(&message) {
                warn!("Serializer refused to inline: model exceeds its size limit");
                MergeOutcome::TooLarge {
                    reason: truncate_diagnostic(&message, self.diagnostic_limit),
                }
            } else {
                warn!("Merge failed: {}", truncate_diagnostic(&message, self.diagnostic_limit));
                self.failed(&message)
            };
        }

        let bytes = match fs::metadata(partial) {
            Ok(meta) => meta.len(),
            Err(e) => return self.failed(&format!("inliner produced no output: {e}")),
        };
        if bytes == 0 {
            return self.failed("inliner produced an empty file");
        }
        if bytes > SERIALIZER_LIMIT_BYTES {
            return MergeOutcome::TooLarge {
                reason: format!("inlined file is {:.1} MiB, above the 2 GiB limit", to_mib(bytes)),
            };
        }

        if let Err(e) = fs::rename(partial, target) {
            return self.failed(&format!("cannot move merged file into place: {e}"));
        }

        info!("Merged into {} ({:.1} MiB)", target.display(), to_mib(bytes));
        MergeOutcome::Merged {
            path: target.to_path_buf(),
            bytes,
        }
    }

    fn failed(&self, message: &str) -> MergeOutcome {
        MergeOutcome::Failed {
            reason: truncate_diagnostic(message, self.diagnostic_limit),
        }
    }
}

/// Sibling path the inliner writes to before the result is moved into place
fn partial_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map_or_else(|| "model.onnx".to_string(), |n| n.to_string_lossy().to_string());
    target.with_file_name(format!("{name}.partial"))
}
