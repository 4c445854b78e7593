//! Artifact publisher
//!
//! Installs a freshly produced artifact into the live model directory. The
//! order is fixed: back up the live graph, copy the new files in, drop the
//! stale weight blob, copy checkpoint companions (tokenizer, config) when
//! the live directory is elsewhere, then remove scratch directories. Publishing is not
//! transactional; a crash mid-way can leave a backup next to a partially
//! written graph, but the backup is never removed before the new graph is
//! confirmed on disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, info, warn};

use crate::core::models::{ArtifactFile, ModelArtifact, PublishedState};
use crate::paths;

/// Installs artifacts into a live model directory
#[derive(Debug, Default, Clone)]
pub struct ArtifactPublisher {
    companions: Vec<PathBuf>,
}

impl ArtifactPublisher {
    /// Create a publisher
    #[must_use]
    pub const fn new() -> Self {
        Self {
            companions: Vec::new(),
        }
    }

    /// Files copied next to the graph, e.g. the checkpoint's tokenizer.
    /// A companion that already lives in the destination is left alone.
    #[must_use]
    pub fn with_companions(mut self, companions: Vec<PathBuf>) -> Self {
        self.companions = companions;
        self
    }

    /// Install `artifact` into `dest`, then remove `scratch_dirs`.
    ///
    /// `merged` records whether `artifact` is the inlined form of a split
    /// export. When the new artifact has no external blob, any blob left at
    /// the destination by an earlier publish is deleted.
    pub fn publish(
        &self,
        artifact: &ModelArtifact,
        merged: bool,
        dest: &Path,
        scratch_dirs: &[PathBuf],
    ) -> anyhow::Result<PublishedState> {
        fs::create_dir_all(dest).with_context(|| format!("cannot create {}", dest.display()))?;

        let backup = backup_live_graph(dest)?;

        let live_graph = paths::graph(dest);
        fs::copy(&artifact.graph.path, &live_graph).with_context(|| {
            format!("cannot copy {} to {}", artifact.graph.path.display(), live_graph.display())
        })?;
        let graph = ArtifactFile::from_path(&live_graph)?;
        if graph.bytes != artifact.graph.bytes {
            anyhow::bail!(
                "copied graph is {} bytes, expected {}",
                graph.bytes,
                artifact.graph.bytes
            );
        }
        info!("Installed {} ({:.2} MiB)", live_graph.display(), graph.mib());

        let live_data = paths::external_data(dest);
        let external = match &artifact.external {
            Some(blob) => {
                fs::copy(&blob.path, &live_data).with_context(|| {
                    format!("cannot copy {} to {}", blob.path.display(), live_data.display())
                })?;
                let installed = ArtifactFile::from_path(&live_data)?;
                info!("Installed {} ({:.2} MiB)", live_data.display(), installed.mib());
                Some(installed)
            },
            None => {
                if live_data.exists() {
                    fs::remove_file(&live_data)
                        .with_context(|| format!("cannot remove stale {}", live_data.display()))?;
                    info!("Removed obsolete {}", live_data.display());
                }
                None
            },
        };

        self.install_companions(dest)?;
        remove_scratch(scratch_dirs);

        Ok(PublishedState {
            dir: dest.to_path_buf(),
            graph,
            external,
            backup,
            merged,
            published_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

impl ArtifactPublisher {
    fn install_companions(&self, dest: &Path) -> anyhow::Result<()> {
        let live_dir = fs::canonicalize(dest)
            .with_context(|| format!("cannot resolve {}", dest.display()))?;

        for source in &self.companions {
            let Some(name) = source.file_name() else {
                continue;
            };
            let same_dir = source
                .parent()
                .and_then(|parent| fs::canonicalize(parent).ok())
                .is_some_and(|parent| parent == live_dir);
            if same_dir {
                continue;
            }

            let target = dest.join(name);
            fs::copy(source, &target).with_context(|| {
                format!("cannot copy {} to {}", source.display(), target.display())
            })?;
            debug!("Installed companion {}", target.display());
        }
        Ok(())
    }
}

/// Move the live graph into the single backup slot, replacing any older
/// backup. Returns the new backup, if there was a live graph.
fn backup_live_graph(dest: &Path) -> anyhow::Result<Option<ArtifactFile>> {
    let live = paths::graph(dest);
    if !live.is_file() {
        return Ok(None);
    }

    let slot = paths::backup(dest);
    if slot.exists() {
        fs::remove_file(&slot).with_context(|| format!("cannot replace {}", slot.display()))?;
    }
    fs::rename(&live, &slot)
        .with_context(|| format!("cannot back up {} to {}", live.display(), slot.display()))?;
    info!("Backed up previous graph to {}", slot.display());

    Ok(Some(ArtifactFile::from_path(&slot)?))
}

/// Scratch cleanup failures are logged, never fatal
fn remove_scratch(scratch_dirs: &[PathBuf]) {
    for dir in scratch_dirs {
        if !dir.exists() {
            continue;
        }
        match fs::remove_dir_all(dir) {
            Ok(()) => debug!("Removed scratch directory {}", dir.display()),
            Err(e) => warn!("Cannot remove scratch directory {}: {e}", dir.display()),
        }
    }
}
