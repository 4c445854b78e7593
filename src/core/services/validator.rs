//! Integrity validator
//!
//! Certifies a published model directory in four ordered stages:
//!
//! 1. Required files are present (graph, tokenizer)
//! 2. The artifact is plausibly sized for its variant
//! 3. A single-file graph does not still reference external data
//! 4. An inference runtime can load it with optimizations disabled
//!
//! Stages 1-3 always run when their inputs exist. Stage 4 is skipped once
//! any error is recorded, since loading a structurally broken artifact tells
//! nothing new.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use log::{debug, info};
use regex::Regex;

use crate::core::models::{
    DEFAULT_DIAGNOSTIC_LIMIT, DiagnosticKind, Severity, SizeExpectation, ValidationReport, to_mib,
    truncate_diagnostic,
};
use crate::core::ports::RuntimeLoader;
use crate::paths::{self, EXTERNAL_DATA_FILE, GRAPH_FILE, TOKENIZER_FILE};

/// Leading bytes of the graph scanned for external references
pub const DEFAULT_SCAN_WINDOW_BYTES: usize = 100_000;

/// Below this a graph file is corrupt regardless of variant
pub const CORRUPT_FLOOR_BYTES: u64 = 1024;

/// Byte markers that betray a reference to an external data file.
///
/// This is a heuristic over raw bytes, not a parse of the serialized graph's
/// reference fields; a tensor or node name containing a marker would produce
/// a false positive.
const EXTERNAL_REFERENCE_MARKERS: [&[u8]; 3] =
    [EXTERNAL_DATA_FILE.as_bytes(), b"onnx_data", b"external_data"];

static MISSING_EXTERNAL_DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)model\.onnx_data|external[ _]data|file_size")
        .expect("external data pattern is valid")
});

static VERSION_MISMATCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bir[ _]version\b|unsupported model version|opset[ _]version")
        .expect("version pattern is valid")
});

/// Classify a runtime-load failure message.
///
/// External-data failures and version mismatches are errors; anything else
/// is a warning, since another runtime may still load the artifact.
#[must_use]
pub fn classify_load_failure(message: &str) -> (Severity, DiagnosticKind) {
    if MISSING_EXTERNAL_DATA.is_match(message) {
        (Severity::Error, DiagnosticKind::MissingExternalData)
    } else if VERSION_MISMATCH.is_match(message) {
        (Severity::Error, DiagnosticKind::VersionIncompatible)
    } else {
        (Severity::Warning, DiagnosticKind::RuntimeLoadFailure)
    }
}

/// Produces a [`ValidationReport`] for a model directory
#[derive(Clone, Copy)]
pub struct IntegrityValidator<'a> {
    runtime: Option<&'a dyn RuntimeLoader>,
    scan_window: usize,
    diagnostic_limit: usize,
}

impl std::fmt::Debug for IntegrityValidator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrityValidator")
            .field("runtime", &self.runtime.is_some())
            .field("scan_window", &self.scan_window)
            .field("diagnostic_limit", &self.diagnostic_limit)
            .finish()
    }
}

impl<'a> IntegrityValidator<'a> {
    /// Validator that runs all four stages
    #[must_use]
    pub const fn new(runtime: &'a dyn RuntimeLoader) -> Self {
        Self {
            runtime: Some(runtime),
            scan_window: DEFAULT_SCAN_WINDOW_BYTES,
            diagnostic_limit: DEFAULT_DIAGNOSTIC_LIMIT,
        }
    }

    /// Validator that stops after the structural stages
    #[must_use]
    pub const fn without_runtime() -> Self {
        Self {
            runtime: None,
            scan_window: DEFAULT_SCAN_WINDOW_BYTES,
            diagnostic_limit: DEFAULT_DIAGNOSTIC_LIMIT,
        }
    }

    /// Override how many leading graph bytes are scanned
    #[must_use]
    pub const fn with_scan_window(mut self, bytes: usize) -> Self {
        self.scan_window = bytes;
        self
    }

    /// Bound the length of runtime error text kept in the report
    #[must_use]
    pub const fn with_diagnostic_limit(mut self, limit: usize) -> Self {
        self.diagnostic_limit = limit;
        self
    }

    /// Validate the artifact in `dir` against `expectation`
    #[must_use]
    pub fn validate(&self, dir: &Path, expectation: &SizeExpectation) -> ValidationReport {
        let mut report = ValidationReport::new();
        let graph = paths::graph(dir);
        let external = paths::external_data(dir);

        check_required_files(dir, &mut report);

        let graph_bytes = fs::metadata(&graph).ok().map(|m| m.len());
        let external_bytes = fs::metadata(&external).ok().filter(|m| m.is_file()).map(|m| m.len());

        if let Some(graph_bytes) = graph_bytes {
            check_size(graph_bytes, external_bytes, expectation, &mut report);
            if external_bytes.is_none() {
                self.scan_external_references(&graph, &mut report);
            }
        }

        if report.passed() {
            self.check_runtime_load(&graph, &mut report);
        } else {
            info!("Skipping runtime load: {} structural error(s)", report.errors().len());
        }

        report
    }

    fn scan_external_references(&self, graph: &Path, report: &mut ValidationReport) {
        let mut head = Vec::with_capacity(self.scan_window);
        let window = u64::try_from(self.scan_window).unwrap_or(u64::MAX);
        let read = File::open(graph).and_then(|f| f.take(window).read_to_end(&mut head));
        if let Err(e) = read {
            report.warning(
                DiagnosticKind::Unreadable,
                format!("cannot inspect {GRAPH_FILE} contents: {e}"),
            );
            return;
        }

        let found = EXTERNAL_REFERENCE_MARKERS
            .iter()
            .find(|marker| head.windows(marker.len()).any(|w| w == **marker));
        if let Some(marker) = found {
            debug!("Found external reference marker {:?}", String::from_utf8_lossy(marker));
            report.error(
                DiagnosticKind::DanglingExternalReference,
                format!(
                    "{GRAPH_FILE} references external data but {EXTERNAL_DATA_FILE} is missing; \
                     loading will fail"
                ),
            );
        }
    }

    fn check_runtime_load(&self, graph: &Path, report: &mut ValidationReport) {
        let Some(runtime) = self.runtime else {
            report.warning(DiagnosticKind::RuntimeSkipped, "runtime load validation was skipped");
            return;
        };

        match runtime.load(graph) {
            Ok(signature) => {
                info!(
                    "Runtime loaded {GRAPH_FILE}: {} input(s), {} output(s)",
                    signature.inputs.len(),
                    signature.outputs.len()
                );
                report.set_signature(signature);
            },
            Err(e) => {
                let raw = format!("{e:#}");
                let detail = truncate_diagnostic(&raw, self.diagnostic_limit);
                let (severity, kind) = classify_load_failure(&raw);
                let message = match kind {
                    DiagnosticKind::MissingExternalData => {
                        format!("runtime load failed: missing external data file {EXTERNAL_DATA_FILE} ({detail})")
                    },
                    DiagnosticKind::VersionIncompatible => {
                        format!("runtime does not support this model version; upgrade the runtime ({detail})")
                    },
                    _ => format!("runtime validation failed: {detail}"),
                };
                report.push(severity, kind, message);
            },
        }
    }
}

fn check_required_files(dir: &Path, report: &mut ValidationReport) {
    for (path, name) in [(paths::graph(dir), GRAPH_FILE), (paths::tokenizer(dir), TOKENIZER_FILE)] {
        if !path.is_file() {
            report.error(
                DiagnosticKind::MissingRequiredFile,
                format!("required file {name} does not exist in {}", dir.display()),
            );
        }
    }
}

fn check_size(
    graph_bytes: u64,
    external_bytes: Option<u64>,
    expectation: &SizeExpectation,
    report: &mut ValidationReport,
) {
    let total = graph_bytes + external_bytes.unwrap_or(0);

    if graph_bytes < CORRUPT_FLOOR_BYTES {
        report.error(
            DiagnosticKind::SizeImplausible,
            format!("{GRAPH_FILE} is only {graph_bytes} bytes; the file is likely corrupt"),
        );
    } else if total < expectation.error_floor() {
        report.error(
            DiagnosticKind::SizeImplausible,
            format!(
                "artifact is only {:.2} MiB, expected about {} MiB for {}; \
                 incomplete, likely missing external weights",
                to_mib(total),
                expectation.expected_mib,
                expectation.variant
            ),
        );
    } else if total < expectation.warn_floor() {
        report.warning(
            DiagnosticKind::SizeImplausible,
            format!(
                "artifact is only {:.1} MiB, expected about {} MiB for {}; it may be incomplete",
                to_mib(total),
                expectation.expected_mib,
                expectation.variant
            ),
        );
    }
}
