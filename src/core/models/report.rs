//! Validation report
//!
//! The report is the only contract surfaced to the CLI layer. Library error
//! text enters it through [`truncate_diagnostic`] so output stays stable
//! across toolchain versions.

use serde::{Deserialize, Serialize};

use super::Severity;

/// Default length of library error text kept in a diagnostic
pub const DEFAULT_DIAGNOSTIC_LIMIT: usize = 200;

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// Graph or tokenizer file is absent
    MissingRequiredFile,
    /// Artifact is far smaller than its variant should be
    SizeImplausible,
    /// Graph references an external weight file that is not there
    DanglingExternalReference,
    /// Runtime load failed because external data could not be found
    MissingExternalData,
    /// Runtime rejected the artifact's format/IR version
    VersionIncompatible,
    /// Runtime load failed for another reason
    RuntimeLoadFailure,
    /// Runtime load was not attempted
    RuntimeSkipped,
    /// A file could not be read for inspection
    Unreadable,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::MissingRequiredFile => "missing-required-file",
            Self::SizeImplausible => "size-implausible",
            Self::DanglingExternalReference => "dangling-external-reference",
            Self::MissingExternalData => "missing-external-data",
            Self::VersionIncompatible => "version-incompatible",
            Self::RuntimeLoadFailure => "runtime-load-failure",
            Self::RuntimeSkipped => "runtime-skipped",
            Self::Unreadable => "unreadable",
        };
        write!(f, "{label}")
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// What the finding is about
    pub kind: DiagnosticKind,
    /// Human-readable description
    pub message: String,
}

/// One dimension of a tensor shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dim {
    /// Static extent
    Fixed(i64),
    /// Named dynamic axis (e.g. "batch")
    Symbolic(String),
    /// Unknown extent
    Unknown,
}

impl std::fmt::Display for Dim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{n}"),
            Self::Symbolic(name) => write!(f, "{name}"),
            Self::Unknown => write!(f, "?"),
        }
    }
}

/// Declared input or output of an inference session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorSignature {
    /// Tensor name
    pub name: String,
    /// Declared shape
    #[serde(default)]
    pub shape: Vec<Dim>,
    /// Element type as reported by the runtime (e.g. "tensor(int64)")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
}

impl std::fmt::Display for TensorSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dims: Vec<String> = self.shape.iter().map(ToString::to_string).collect();
        write!(f, "{}: [{}]", self.name, dims.join(", "))?;
        if let Some(ty) = &self.element_type {
            write!(f, " {ty}")?;
        }
        Ok(())
    }
}

/// Input and output signatures of a loaded session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSignature {
    /// Declared inputs
    #[serde(default)]
    pub inputs: Vec<TensorSignature>,
    /// Declared outputs
    #[serde(default)]
    pub outputs: Vec<TensorSignature>,
}

/// Result of validating a published artifact directory.
///
/// `passed` is derived from the error list; warnings never block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    signature: Option<SessionSignature>,
}

impl ValidationReport {
    /// An empty, passing report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding at the given severity
    pub fn push(&mut self, severity: Severity, kind: DiagnosticKind, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            kind,
            message: message.into(),
        };
        match severity {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Warning => self.warnings.push(diagnostic),
        }
    }

    /// Record an error
    pub fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Severity::Error, kind, message);
    }

    /// Record a warning
    pub fn warning(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Severity::Warning, kind, message);
    }

    /// Record the signatures of a successfully loaded session
    pub fn set_signature(&mut self, signature: SessionSignature) {
        self.signature = Some(signature);
    }

    /// True iff no errors were recorded
    #[must_use]
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors in the order they were found
    #[must_use]
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Warnings in the order they were found
    #[must_use]
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Whether an error of the given kind was recorded
    #[must_use]
    pub fn has_error(&self, kind: DiagnosticKind) -> bool {
        self.errors.iter().any(|d| d.kind == kind)
    }

    /// Whether a warning of the given kind was recorded
    #[must_use]
    pub fn has_warning(&self, kind: DiagnosticKind) -> bool {
        self.warnings.iter().any(|d| d.kind == kind)
    }

    /// Observed input signatures (empty unless the runtime loaded the graph)
    #[must_use]
    pub fn inputs(&self) -> &[TensorSignature] {
        self.signature.as_ref().map_or(&[][..], |s| s.inputs.as_slice())
    }

    /// Observed output signatures (empty unless the runtime loaded the graph)
    #[must_use]
    pub fn outputs(&self) -> &[TensorSignature] {
        self.signature.as_ref().map_or(&[][..], |s| s.outputs.as_slice())
    }

    /// Whether the runtime load stage succeeded
    #[must_use]
    pub const fn runtime_loaded(&self) -> bool {
        self.signature.is_some()
    }
}

/// Keep a bounded, whitespace-trimmed prefix of library error text.
///
/// Cuts on a char boundary and marks the cut with an ellipsis.
#[must_use]
pub fn truncate_diagnostic(message: &str, limit: usize) -> String {
    let message = message.trim();
    match message.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}…", &message[..idx]),
        None => message.to_string(),
    }
}
