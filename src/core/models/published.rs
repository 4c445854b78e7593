//! Published state of a live model directory

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ArtifactFile;

/// What a publish left in the live model directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedState {
    /// The live model directory
    pub dir: PathBuf,
    /// Installed graph file
    pub graph: ArtifactFile,
    /// Installed external weight blob, if the artifact stayed split
    pub external: Option<ArtifactFile>,
    /// Backup of the previously live graph, if there was one
    pub backup: Option<ArtifactFile>,
    /// Whether the installed graph is the merged single-file form
    pub merged: bool,
    /// When the publish completed (RFC 3339)
    pub published_at: String,
}
