//! Pipeline configuration
//!
//! Loaded from TOML. Lookup order: an explicit path, `./onnxport.toml`, then
//! `~/.config/onnxport/config.toml`. Missing files mean built-in defaults;
//! every section and key is optional.
//!
//! ```toml
//! [python]
//! interpreter = "python3"
//! mirror_endpoint = "https://hf-mirror.com"
//!
//! [export]
//! strategies = ["managed-export", "cli-export", "raw-export"]
//! opset_candidates = [17, 16, 15, 14, 13, 12, 11]
//!
//! [merge]
//! ceiling_mib = 1900
//!
//! [[validation.sizes]]
//! variant = "my-model"
//! family = "embedding"
//! expected_mib = 500
//! error_below_mib = 50
//! warn_below_mib = 250
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapters::PythonRunner;
use crate::core::models::{
    DEFAULT_DIAGNOSTIC_LIMIT, ExportAttempt, ExportMethod, MIB, SizeExpectation, SizeTable,
    expand_attempts,
};
use crate::core::services::{
    DEFAULT_MERGE_CEILING_BYTES, DEFAULT_OPSET_CANDIDATES, DEFAULT_SCAN_WINDOW_BYTES,
    PipelineSettings,
};
use crate::paths;

/// Errors from loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config {path}: {source}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying TOML error
        source: toml::de::Error,
    },

    /// Values parse but cannot drive a pipeline
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Full configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Python toolchain
    pub python: PythonConfig,
    /// Export stage
    pub export: ExportConfig,
    /// Merge stage
    pub merge: MergeConfig,
    /// Validation stage
    pub validation: ValidationConfig,
    /// File this configuration came from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// `[python]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// Interpreter to run
    pub interpreter: String,
    /// Model hub mirror, passed to children as `HF_ENDPOINT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_endpoint: Option<String>,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            mirror_endpoint: None,
        }
    }
}

/// `[export]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Methods in preference order
    pub strategies: Vec<ExportMethod>,
    /// Opsets tried by raw export, in order
    pub opset_candidates: Vec<u32>,
    /// Acceptance gate override; the family floor applies when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_artifact_mib: Option<u64>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            strategies: ExportMethod::DEFAULT_ORDER.to_vec(),
            opset_candidates: DEFAULT_OPSET_CANDIDATES.to_vec(),
            min_artifact_mib: None,
        }
    }
}

/// `[merge]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Largest combined size that is inlined
    pub ceiling_mib: u64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            ceiling_mib: DEFAULT_MERGE_CEILING_BYTES / MIB,
        }
    }
}

/// `[validation]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Run the runtime-load stage
    pub runtime_check: bool,
    /// Graph bytes scanned for external-data markers
    pub scan_window_bytes: usize,
    /// Characters of library error text kept in reports
    pub diagnostic_prefix: usize,
    /// Size table entries added to, or replacing, the built-in ones
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<SizeExpectation>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            runtime_check: true,
            scan_window_bytes: DEFAULT_SCAN_WINDOW_BYTES,
            diagnostic_prefix: DEFAULT_DIAGNOSTIC_LIMIT,
            sizes: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration, trying `explicit` first.
    ///
    /// An explicit path must exist; the implicit locations are skipped when
    /// absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        for candidate in [PathBuf::from(paths::PROJECT_CONFIG), paths::global_config()] {
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Parse a specific file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        config.source = Some(path.to_path_buf());
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text without validation
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reject values no pipeline can run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.export.strategies.is_empty() {
            return Err(ConfigError::Invalid("export.strategies is empty".to_string()));
        }
        let needs_opsets = self.export.strategies.iter().any(|m| m.needs_opset());
        if needs_opsets && self.export.opset_candidates.is_empty() {
            return Err(ConfigError::Invalid(
                "raw-export is enabled but export.opset_candidates is empty".to_string(),
            ));
        }
        if self.python.interpreter.trim().is_empty() {
            return Err(ConfigError::Invalid("python.interpreter is empty".to_string()));
        }
        Ok(())
    }

    /// Ordered attempt list, raw export expanded per opset
    #[must_use]
    pub fn attempts(&self) -> Vec<ExportAttempt> {
        expand_attempts(&self.export.strategies, &self.export.opset_candidates)
    }

    /// Built-in size table with configured overrides applied
    #[must_use]
    pub fn size_table(&self) -> SizeTable {
        SizeTable::builtin().with_overrides(&self.validation.sizes)
    }

    /// Pipeline tunables
    #[must_use]
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            attempts: self.attempts(),
            min_artifact_bytes: self
                .export
                .min_artifact_mib
                .map(|mib| mib.saturating_mul(MIB)),
            merge_ceiling_bytes: self.merge.ceiling_mib.saturating_mul(MIB),
            scan_window_bytes: self.validation.scan_window_bytes,
            diagnostic_limit: self.validation.diagnostic_prefix,
        }
    }

    /// Python runner for the configured interpreter and mirror
    #[must_use]
    pub fn runner(&self) -> PythonRunner {
        PythonRunner::new(self.python.interpreter.clone())
            .with_mirror_endpoint(self.python.mirror_endpoint.clone())
    }
}
