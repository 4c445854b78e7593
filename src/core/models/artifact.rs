//! Model artifact files
//!
//! An artifact is a graph file plus an optional external weight blob that the
//! graph references by name. Export creates one, merge replaces it with an
//! inlined single-file form, publish installs it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::paths::{EXTERNAL_DATA_FILE, GRAPH_FILE};

/// One mebibyte in bytes
pub const MIB: u64 = 1024 * 1024;

/// Convert a byte count to MiB for display
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_mib(bytes: u64) -> f64 {
    bytes as f64 / MIB as f64
}

/// A file on disk together with its size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFile {
    /// Location of the file
    pub path: PathBuf,
    /// Size in bytes
    pub bytes: u64,
}

impl ArtifactFile {
    /// Stat a file and record its size
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = fs::metadata(path)?.len();
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }

    /// Size in MiB
    #[must_use]
    pub fn mib(&self) -> f64 {
        to_mib(self.bytes)
    }
}

/// A graph file and its optional external weight blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// The serialized graph
    pub graph: ArtifactFile,
    /// External tensor data referenced by the graph
    pub external: Option<ArtifactFile>,
}

impl ModelArtifact {
    /// A single-file artifact with all weights inlined
    #[must_use]
    pub const fn single(graph: ArtifactFile) -> Self {
        Self {
            graph,
            external: None,
        }
    }

    /// Build an artifact from a graph path, picking up a sibling weight blob
    pub fn from_graph(graph: impl AsRef<Path>) -> io::Result<Self> {
        let graph = ArtifactFile::from_path(graph)?;
        let sibling = graph.path.with_file_name(EXTERNAL_DATA_FILE);
        let external = if sibling.is_file() { Some(ArtifactFile::from_path(sibling)?) } else { None };
        Ok(Self { graph, external })
    }

    /// Search `dir` recursively for exported files.
    ///
    /// Exporters may nest their output, so the largest `model.onnx` wins.
    /// Its sibling weight blob is preferred; otherwise the largest blob found
    /// anywhere under `dir` is used.
    pub fn discover(dir: &Path) -> io::Result<Option<Self>> {
        let mut graphs = Vec::new();
        let mut blobs = Vec::new();

        for entry in WalkDir::new(dir) {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name == GRAPH_FILE {
                graphs.push(ArtifactFile::from_path(entry.path())?);
            } else if name == EXTERNAL_DATA_FILE {
                blobs.push(ArtifactFile::from_path(entry.path())?);
            }
        }

        let Some(graph) = graphs.into_iter().max_by_key(|f| f.bytes) else {
            return Ok(None);
        };

        let sibling = graph.path.with_file_name(EXTERNAL_DATA_FILE);
        let external = match blobs.iter().position(|b| b.path == sibling) {
            Some(idx) => Some(blobs.swap_remove(idx)),
            None => blobs.into_iter().max_by_key(|f| f.bytes),
        };

        Ok(Some(Self { graph, external }))
    }

    /// Whether the weights live in a separate file
    #[must_use]
    pub const fn is_split(&self) -> bool {
        self.external.is_some()
    }

    /// Graph plus external blob, in bytes
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.graph.bytes + self.external.as_ref().map_or(0, |e| e.bytes)
    }
}
