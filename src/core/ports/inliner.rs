//! Graph inliner port
//!
//! Defines the interface for rewriting a split artifact into one file.

use std::path::Path;

/// Loads a graph with its external data resolved and re-serializes it with
/// every tensor embedded.
pub trait GraphInliner {
    /// Inline `graph` (and the external data it references) into `target`.
    fn inline(&self, graph: &Path, target: &Path) -> anyhow::Result<()>;
}
