//! Centralized path definitions for onnxport
//!
//! A single source of truth for the artifact directory layout and for the
//! scratch directories used while exporting.
//!
//! ## Model Directory Layout
//!
//! ```text
//! <model_dir>/
//! ├── model.onnx           # required graph file
//! ├── model.onnx_data      # optional external weight blob
//! ├── tokenizer.json       # required tokenizer description
//! └── model.onnx.bak       # at most one generation, written on publish
//! ```
//!
//! ## Scratch Layout
//!
//! ```text
//! <model_dir>-onnx/        # raw exporter output (removed after publish)
//! └── merged/
//!     └── model.onnx       # inlined single-file graph, if merge succeeded
//! ```

use std::path::{Path, PathBuf};

/// Graph file name
pub const GRAPH_FILE: &str = "model.onnx";

/// External weight blob file name
pub const EXTERNAL_DATA_FILE: &str = "model.onnx_data";

/// Tokenizer description file name
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Single-generation backup of the previously published graph
pub const BACKUP_FILE: &str = "model.onnx.bak";

/// Checkpoint files the live directory needs next to the graph
pub const COMPANION_FILES: [&str; 6] = [
    TOKENIZER_FILE,
    "tokenizer_config.json",
    "special_tokens_map.json",
    "config.json",
    "vocab.txt",
    "sentencepiece.bpe.model",
];

/// Project configuration filename
pub const PROJECT_CONFIG: &str = "onnxport.toml";

/// Suffix appended to the destination directory name for raw exports
const EXPORT_DIR_SUFFIX: &str = "-onnx";

/// Subdirectory of the export directory holding the merged graph
const MERGED_DIR: &str = "merged";

/// Path of the graph file inside a model directory
#[must_use]
pub fn graph(model_dir: &Path) -> PathBuf {
    model_dir.join(GRAPH_FILE)
}

/// Path of the external weight blob inside a model directory
#[must_use]
pub fn external_data(model_dir: &Path) -> PathBuf {
    model_dir.join(EXTERNAL_DATA_FILE)
}

/// Path of the tokenizer description inside a model directory
#[must_use]
pub fn tokenizer(model_dir: &Path) -> PathBuf {
    model_dir.join(TOKENIZER_FILE)
}

/// Path of the graph backup slot inside a model directory
#[must_use]
pub fn backup(model_dir: &Path) -> PathBuf {
    model_dir.join(BACKUP_FILE)
}

/// Companion files present in a checkpoint directory
#[must_use]
pub fn companions(checkpoint_dir: &Path) -> Vec<PathBuf> {
    COMPANION_FILES
        .iter()
        .map(|name| checkpoint_dir.join(name))
        .filter(|path| path.is_file())
        .collect()
}

/// Scratch directory for raw exporter output, a sibling of `model_dir`.
///
/// `models/bge-base-zh` exports into `models/bge-base-zh-onnx`.
#[must_use]
pub fn export_dir(model_dir: &Path) -> PathBuf {
    let name = model_dir
        .file_name()
        .map_or_else(|| "model".to_string(), |n| n.to_string_lossy().to_string());
    let parent = model_dir.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{name}{EXPORT_DIR_SUFFIX}"))
}

/// Staging directory for the merged single-file graph
#[must_use]
pub fn merged_dir(export_dir: &Path) -> PathBuf {
    export_dir.join(MERGED_DIR)
}

/// Get the global config directory (`~/.config/onnxport`)
#[must_use]
pub fn global_config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config")).join("onnxport")
}

/// Get the global config file path (`~/.config/onnxport/config.toml`)
#[must_use]
pub fn global_config() -> PathBuf {
    global_config_dir().join("config.toml")
}
