//! Output formatting for human and JSON modes
//!
//! Every command builds one result struct and calls `render`. Human output
//! is coloured; JSON output is the struct itself, pretty-printed.

use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;

use crate::adapters::ModuleProbe;
use crate::core::models::{
    Diagnostic, ExportResult, PublishedState, SizeExpectation, TensorSignature, ValidationReport,
    to_mib,
};
use crate::core::services::{AttemptSummary, MergeOutcome, PipelineReport};

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (machine-readable)
    Json,
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Result of validating a model directory
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// Directory that was validated
    pub dir: PathBuf,
    /// Whether no errors were found
    pub passed: bool,
    /// Blocking findings
    pub errors: Vec<Diagnostic>,
    /// Informational findings
    pub warnings: Vec<Diagnostic>,
    /// Session inputs, if the runtime loaded the graph
    pub inputs: Vec<TensorSignature>,
    /// Session outputs, if the runtime loaded the graph
    pub outputs: Vec<TensorSignature>,
}

impl ValidationResult {
    /// Snapshot a report for rendering
    #[must_use]
    pub fn new(dir: &Path, report: &ValidationReport) -> Self {
        Self {
            dir: dir.to_path_buf(),
            passed: report.passed(),
            errors: report.errors().to_vec(),
            warnings: report.warnings().to_vec(),
            inputs: report.inputs().to_vec(),
            outputs: report.outputs().to_vec(),
        }
    }

    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        println!("Validating {}\n", self.dir.display());
        self.render_body();
    }

    fn render_body(&self) {
        for d in &self.errors {
            println!("  {} [{}] {}", "error".red().bold(), d.kind, d.message);
        }
        for d in &self.warnings {
            println!("  {} [{}] {}", "warning".yellow().bold(), d.kind, d.message);
        }

        if !self.inputs.is_empty() || !self.outputs.is_empty() {
            println!("\n  Inputs:");
            for t in &self.inputs {
                println!("    - {t}");
            }
            println!("  Outputs:");
            for t in &self.outputs {
                println!("    - {t}");
            }
        }

        println!();
        if self.passed {
            println!("{} ({} warning(s))", "PASSED".green().bold(), self.warnings.len());
        } else {
            println!("{}: {} error(s)", "FAILED".red().bold(), self.errors.len());
        }
    }
}

/// Result of a full conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConvertResult {
    /// Source checkpoint directory
    pub checkpoint: PathBuf,
    /// Live model directory
    pub dest: PathBuf,
    /// Whether an artifact was published and passed validation
    pub success: bool,
    /// Every export attempt, in order
    pub attempts: Vec<AttemptSummary>,
    /// Accepted attempt, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted: Option<String>,
    /// Merge outcome, if the export was split
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeOutcome>,
    /// Publish outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<PublishedState>,
    /// Validation of the published directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
    /// Fatal error, if the pipeline aborted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConvertResult {
    /// Result of a pipeline run that reached validation
    #[must_use]
    pub fn completed(checkpoint: &Path, report: &PipelineReport) -> Self {
        let validation = ValidationResult::new(&report.published.dir, &report.validation);
        Self {
            checkpoint: checkpoint.to_path_buf(),
            dest: report.published.dir.clone(),
            success: validation.passed,
            attempts: report.attempts.iter().map(AttemptSummary::from).collect(),
            accepted: Some(report.accepted.to_string()),
            merge: report.merge.clone(),
            published: Some(report.published.clone()),
            validation: Some(validation),
            error: None,
        }
    }

    /// Result of a pipeline run that aborted
    #[must_use]
    pub fn aborted(checkpoint: &Path, dest: &Path, attempts: &[ExportResult], error: String) -> Self {
        Self {
            checkpoint: checkpoint.to_path_buf(),
            dest: dest.to_path_buf(),
            success: false,
            attempts: attempts.iter().map(AttemptSummary::from).collect(),
            accepted: None,
            merge: None,
            published: None,
            validation: None,
            error: Some(error),
        }
    }

    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        println!("Converting {} -> {}\n", self.checkpoint.display(), self.dest.display());

        println!("Export attempts:");
        for a in &self.attempts {
            let mark = if a.success { "ok".green() } else { "failed".red() };
            println!("  [{mark}] {}: {}", a.attempt, a.message);
        }

        if let Some(merge) = &self.merge {
            println!("\nMerge: {}", describe_merge(merge));
        }

        if let Some(published) = &self.published {
            println!("\nPublished to {}", published.dir.display());
            println!("  {} ({:.1} MiB)", published.graph.path.display(), published.graph.mib());
            if let Some(external) = &published.external {
                println!("  {} ({:.1} MiB)", external.path.display(), external.mib());
            }
            if let Some(backup) = &published.backup {
                println!("  backup: {}", backup.path.display());
            }
        }

        if let Some(validation) = &self.validation {
            println!("\nValidation:");
            validation.render_body();
        }

        if let Some(error) = &self.error {
            println!("\n{}: {error}", "FAILED".red().bold());
        }
    }
}

/// Result of a standalone merge
#[derive(Debug, Clone, Serialize)]
pub struct MergeResult {
    /// Input graph
    pub graph: PathBuf,
    /// External data next to it, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<PathBuf>,
    /// What happened
    pub outcome: MergeOutcome,
}

impl MergeResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => {
                println!("Merging {}", self.graph.display());
                if let Some(external) = &self.external {
                    println!("  external data: {}", external.display());
                }
                println!("{}", describe_merge(&self.outcome));
            },
            OutputMode::Json => print_json(self),
        }
    }
}

fn describe_merge(outcome: &MergeOutcome) -> String {
    match outcome {
        MergeOutcome::Merged { path, bytes } => {
            format!("{} into {} ({:.1} MiB)", "merged".green(), path.display(), to_mib(*bytes))
        },
        MergeOutcome::SkippedTooLarge {
            combined_bytes,
            ceiling_bytes,
        } => format!(
            "{}: {:.1} MiB is above the {:.0} MiB ceiling, keeping split files",
            "skipped".yellow(),
            to_mib(*combined_bytes),
            to_mib(*ceiling_bytes)
        ),
        MergeOutcome::TooLarge { reason } => {
            format!("{}: {reason}, keeping split files", "too large".yellow())
        },
        MergeOutcome::Failed { reason } => {
            format!("{}: {reason}, keeping split files", "not merged".yellow())
        },
    }
}

/// The configured attempt order and thresholds
#[derive(Debug, Clone, Serialize)]
pub struct PlanResult {
    /// Config file in effect, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
    /// Attempts in the order they will be tried
    pub attempts: Vec<String>,
    /// Acceptance gate override in MiB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_artifact_mib: Option<u64>,
    /// Merge ceiling in MiB
    pub merge_ceiling_mib: u64,
    /// Size table in effect
    pub sizes: Vec<SizeExpectation>,
}

impl PlanResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        match &self.config {
            Some(path) => println!("Config: {}\n", path.display()),
            None => println!("Config: built-in defaults\n"),
        }

        println!("Export attempts:");
        for (i, a) in self.attempts.iter().enumerate() {
            println!("  {:>2}. {a}", i + 1);
        }

        match self.min_artifact_mib {
            Some(mib) => println!("\nAcceptance floor: {mib} MiB"),
            None => println!("\nAcceptance floor: per family"),
        }
        println!("Merge ceiling: {} MiB\n", self.merge_ceiling_mib);

        println!("Size table (MiB):");
        println!("  {:<16} {:<11} {:>8} {:>8} {:>8}", "variant", "family", "expected", "error<", "warn<");
        for s in &self.sizes {
            println!(
                "  {:<16} {:<11} {:>8} {:>8} {:>8}",
                s.variant, s.family, s.expected_mib, s.error_below_mib, s.warn_below_mib
            );
        }
    }
}

/// Toolchain availability
#[derive(Debug, Clone, Serialize)]
pub struct DoctorResult {
    /// Interpreter probed
    pub interpreter: String,
    /// Its version, if it ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
    /// Mirror endpoint passed to children
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_endpoint: Option<String>,
    /// Per-module import checks
    pub modules: Vec<ModuleProbe>,
}

impl DoctorResult {
    /// Whether the interpreter ran and every module imported
    #[must_use]
    pub fn healthy(&self) -> bool {
        self.python_version.is_some() && self.modules.iter().all(ModuleProbe::available)
    }

    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        match &self.python_version {
            Some(v) => println!("Python: {} ({v})", self.interpreter),
            None => println!("Python: {} {}", self.interpreter, "not runnable".red()),
        }
        if let Some(endpoint) = &self.mirror_endpoint {
            println!("Mirror: {endpoint}");
        }
        println!();

        for m in &self.modules {
            match &m.version {
                Some(v) => println!("  {} {:<22} {v}", "ok".green(), m.module),
                None => println!(
                    "  {} {:<22} needed for {}",
                    "missing".red(),
                    m.module,
                    m.needed_for
                ),
            }
        }
    }
}
