//! Domain models for onnxport
//!
//! Pure data structures with no I/O beyond stat-ing files.
//!
//! - [`ModelFamily`] / [`SizeExpectation`] - What a complete artifact weighs
//! - [`ExportAttempt`] / [`ExportResult`] - One try at producing an artifact
//! - [`ModelArtifact`] - A graph file plus optional external weights
//! - [`ValidationReport`] - Errors, warnings and observed signatures
//! - [`PublishedState`] - What a publish left in the live directory

mod artifact;
mod attempt;
mod family;
mod published;
mod report;
mod severity;

pub use artifact::{ArtifactFile, MIB, ModelArtifact, to_mib};
pub use attempt::{ExportAttempt, ExportMethod, ExportResult, expand_attempts};
pub use family::{ModelFamily, SizeExpectation, SizeTable, SourceCheckpoint};
pub use published::PublishedState;
pub use report::{
    DEFAULT_DIAGNOSTIC_LIMIT, Diagnostic, DiagnosticKind, Dim, SessionSignature, TensorSignature,
    ValidationReport, truncate_diagnostic,
};
pub use severity::Severity;
