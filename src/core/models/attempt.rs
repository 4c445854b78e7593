//! Export attempts and their results
//!
//! An attempt is one (method, opset) pair tried against a checkpoint. The
//! attempt list is ordered by preference and fixed before the first try.

use serde::{Deserialize, Serialize};

use super::ModelArtifact;

/// How an export attempt produces its artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportMethod {
    /// High-level in-process exporter that traces the graph and splits
    /// external data on its own
    ManagedExport,
    /// The same exporter driven through its command-line entry point
    CliExport,
    /// Low-level graph export needing an explicit opset
    RawExport,
}

impl ExportMethod {
    /// Preference order used when nothing is configured
    pub const DEFAULT_ORDER: [Self; 3] = [Self::ManagedExport, Self::CliExport, Self::RawExport];

    /// Whether attempts of this method carry an opset
    #[must_use]
    pub const fn needs_opset(self) -> bool {
        matches!(self, Self::RawExport)
    }
}

impl std::fmt::Display for ExportMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManagedExport => write!(f, "managed-export"),
            Self::CliExport => write!(f, "cli-export"),
            Self::RawExport => write!(f, "raw-export"),
        }
    }
}

impl std::str::FromStr for ExportMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "managed-export" | "managed" => Ok(Self::ManagedExport),
            "cli-export" | "cli" => Ok(Self::CliExport),
            "raw-export" | "raw" => Ok(Self::RawExport),
            _ => Err(format!("Invalid export method: {s}. Use: managed-export, cli-export, raw-export")),
        }
    }
}

/// One (method, opset) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportAttempt {
    /// Export method
    pub method: ExportMethod,
    /// Opset for raw export, `None` otherwise
    pub opset: Option<u32>,
}

impl ExportAttempt {
    /// Managed exporter attempt
    #[must_use]
    pub const fn managed() -> Self {
        Self {
            method: ExportMethod::ManagedExport,
            opset: None,
        }
    }

    /// Command-line exporter attempt
    #[must_use]
    pub const fn cli() -> Self {
        Self {
            method: ExportMethod::CliExport,
            opset: None,
        }
    }

    /// Raw export attempt at a given opset
    #[must_use]
    pub const fn raw(opset: u32) -> Self {
        Self {
            method: ExportMethod::RawExport,
            opset: Some(opset),
        }
    }
}

impl std::fmt::Display for ExportAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.opset {
            Some(opset) => write!(f, "{} (opset {opset})", self.method),
            None => write!(f, "{}", self.method),
        }
    }
}

/// Expand an ordered method list into concrete attempts.
///
/// Methods needing an opset expand to one attempt per candidate, in the
/// candidate order given.
#[must_use]
pub fn expand_attempts(methods: &[ExportMethod], opsets: &[u32]) -> Vec<ExportAttempt> {
    methods
        .iter()
        .flat_map(|&method| {
            if method.needs_opset() {
                opsets
                    .iter()
                    .map(|&opset| ExportAttempt {
                        method,
                        opset: Some(opset),
                    })
                    .collect::<Vec<_>>()
            } else {
                vec![ExportAttempt { method, opset: None }]
            }
        })
        .collect()
}

/// Outcome of one export attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResult {
    /// The attempt this result belongs to
    pub attempt: ExportAttempt,
    /// Whether the attempt produced an accepted artifact
    pub success: bool,
    /// The produced artifact, if any
    pub artifact: Option<ModelArtifact>,
    /// Diagnostic message
    pub message: String,
}

impl ExportResult {
    /// A successful attempt
    #[must_use]
    pub fn succeeded(attempt: ExportAttempt, artifact: ModelArtifact, message: impl Into<String>) -> Self {
        Self {
            attempt,
            success: true,
            artifact: Some(artifact),
            message: message.into(),
        }
    }

    /// A failed attempt
    #[must_use]
    pub fn failed(attempt: ExportAttempt, message: impl Into<String>) -> Self {
        Self {
            attempt,
            success: false,
            artifact: None,
            message: message.into(),
        }
    }
}
