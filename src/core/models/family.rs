//! Model families and expected artifact sizes
//!
//! The size table is a heuristic: a fully exported embedding model weighs in
//! at hundreds of megabytes, a generative one at a gigabyte or more. An
//! artifact far below its expected floor almost always lost its weights.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::artifact::MIB;

/// Broad class of model being exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// Sentence/feature embedding models (BGE, text2vec)
    #[default]
    Embedding,
    /// Causal language models (Qwen)
    Generative,
}

impl ModelFamily {
    /// Minimum plausible size of a freshly exported artifact.
    ///
    /// Anything at or below this is treated as a silently truncated export.
    #[must_use]
    pub const fn min_export_bytes(self) -> u64 {
        match self {
            Self::Embedding => 10 * MIB,
            Self::Generative => 100 * MIB,
        }
    }

    /// Size expectation used when the variant is unknown
    #[must_use]
    pub fn default_expectation(self) -> SizeExpectation {
        match self {
            Self::Embedding => SizeExpectation::new("embedding", self, 400, 10, 100),
            Self::Generative => SizeExpectation::new("generative", self, 1000, 100, 400),
        }
    }

    /// Export task passed to the optimum exporters, if any
    #[must_use]
    pub const fn optimum_task(self) -> Option<&'static str> {
        match self {
            Self::Embedding => None,
            Self::Generative => Some("text-generation-with-past"),
        }
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedding => write!(f, "embedding"),
            Self::Generative => write!(f, "generative"),
        }
    }
}

impl std::str::FromStr for ModelFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "embedding" | "embed" => Ok(Self::Embedding),
            "generative" | "causal-lm" | "llm" => Ok(Self::Generative),
            _ => Err(format!("Invalid model family: {s}. Use: embedding, generative")),
        }
    }
}

/// Expected size of a published artifact for one model variant.
///
/// All figures are in MiB so they read naturally in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeExpectation {
    /// Variant key (e.g. "bge-base-zh")
    pub variant: String,
    /// Family this variant belongs to
    pub family: ModelFamily,
    /// Typical size of a complete artifact
    pub expected_mib: u64,
    /// Below this the artifact is reported as incomplete (error)
    pub error_below_mib: u64,
    /// Below this the artifact is reported as suspect (warning)
    pub warn_below_mib: u64,
}

impl SizeExpectation {
    /// Create a new size expectation
    #[must_use]
    pub fn new(
        variant: &str,
        family: ModelFamily,
        expected_mib: u64,
        error_below_mib: u64,
        warn_below_mib: u64,
    ) -> Self {
        Self {
            variant: variant.to_string(),
            family,
            expected_mib,
            error_below_mib,
            warn_below_mib,
        }
    }

    /// Error floor in bytes
    #[must_use]
    pub const fn error_floor(&self) -> u64 {
        self.error_below_mib.saturating_mul(MIB)
    }

    /// Warning floor in bytes
    #[must_use]
    pub const fn warn_floor(&self) -> u64 {
        self.warn_below_mib.saturating_mul(MIB)
    }
}

/// Lookup table of size expectations keyed by variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeTable {
    entries: Vec<SizeExpectation>,
}

impl SizeTable {
    /// The built-in table for the variants the tool knows about
    #[must_use]
    pub fn builtin() -> Self {
        use ModelFamily::{Embedding, Generative};

        Self {
            entries: vec![
                SizeExpectation::new("bge-base-zh", Embedding, 400, 10, 100),
                SizeExpectation::new("bge-large-zh", Embedding, 1300, 100, 650),
                SizeExpectation::new("bge-m3", Embedding, 2200, 200, 1100),
                SizeExpectation::new("text2vec-base", Embedding, 400, 10, 100),
                SizeExpectation::new("text2vec-large", Embedding, 1300, 100, 650),
                SizeExpectation::new("qwen2.5-0.5b", Generative, 1000, 100, 500),
                SizeExpectation::new("qwen2.5-1.5b", Generative, 3000, 300, 1500),
                SizeExpectation::new("qwen2-7b", Generative, 14000, 1400, 7000),
            ],
        }
    }

    /// Replace or add entries, keyed by variant name
    #[must_use]
    pub fn with_overrides(mut self, overrides: &[SizeExpectation]) -> Self {
        for entry in overrides {
            match self.entries.iter_mut().find(|e| e.variant.eq_ignore_ascii_case(&entry.variant)) {
                Some(existing) => *existing = entry.clone(),
                None => self.entries.push(entry.clone()),
            }
        }
        self
    }

    /// All entries in table order
    #[must_use]
    pub fn entries(&self) -> &[SizeExpectation] {
        &self.entries
    }

    /// Find the expectation for a variant, falling back to the family default
    #[must_use]
    pub fn lookup(&self, variant: Option<&str>, family: ModelFamily) -> SizeExpectation {
        variant
            .and_then(|v| self.entries.iter().find(|e| e.variant.eq_ignore_ascii_case(v)))
            .cloned()
            .unwrap_or_else(|| family.default_expectation())
    }
}

impl Default for SizeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A trained model in its native (non-ONNX) representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCheckpoint {
    /// Checkpoint directory (read-only)
    pub dir: PathBuf,
    /// Model family, which decides export task and size floors
    pub family: ModelFamily,
}

impl SourceCheckpoint {
    /// Create a checkpoint reference
    #[must_use]
    pub fn new(dir: impl AsRef<Path>, family: ModelFamily) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            family,
        }
    }

    /// Whether the checkpoint directory exists
    #[must_use]
    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }
}
