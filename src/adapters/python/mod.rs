//! Python toolchain adapter
//!
//! Implements the export, inline and runtime-load ports by running the
//! Python ONNX toolchain (`optimum`, `torch.onnx`, `onnx`, `onnxruntime`) in
//! child processes. Every call blocks until the child exits.
//!
//! - [`scripts`] - Embedded Python programs
//! - [`exporter`] - [`Exporter`](crate::core::ports::Exporter) implementation
//! - [`inliner`] - [`GraphInliner`](crate::core::ports::GraphInliner) implementation
//! - [`runtime`] - [`RuntimeLoader`](crate::core::ports::RuntimeLoader) implementation

pub mod exporter;
pub mod inliner;
pub mod runtime;
pub mod scripts;

use std::ffi::OsStr;
use std::process::{Command, Output};

use log::debug;
use serde::Serialize;

pub use exporter::PythonExporter;
pub use inliner::PythonInliner;
pub use runtime::PythonRuntimeLoader;

/// Environment variable the Hugging Face libraries read their mirror from
pub const MIRROR_ENV: &str = "HF_ENDPOINT";

/// Modules probed by `doctor`, with the stage that needs them
pub const TOOLCHAIN_MODULES: [(&str, &str); 6] = [
    ("optimum", "managed and cli export"),
    ("torch", "raw export"),
    ("transformers", "raw export"),
    ("sentence_transformers", "embedding checkpoints"),
    ("onnx", "merge"),
    ("onnxruntime", "runtime validation"),
];

/// Runs Python programs in child processes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonRunner {
    interpreter: String,
    mirror_endpoint: Option<String>,
}

impl Default for PythonRunner {
    fn default() -> Self {
        Self::new("python3")
    }
}

impl PythonRunner {
    /// Create a runner for `interpreter`
    #[must_use]
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            mirror_endpoint: None,
        }
    }

    /// Point child processes at a model mirror.
    ///
    /// Only the child's environment is touched.
    #[must_use]
    pub fn with_mirror_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.mirror_endpoint = endpoint;
        self
    }

    /// The interpreter this runner invokes
    #[must_use]
    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// The mirror endpoint passed to children, if any
    #[must_use]
    pub fn mirror_endpoint(&self) -> Option<&str> {
        self.mirror_endpoint.as_deref()
    }

    /// Build a command for the interpreter with the child environment set
    #[must_use]
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.interpreter);
        if let Some(endpoint) = &self.mirror_endpoint {
            cmd.env(MIRROR_ENV, endpoint);
        }
        cmd
    }

    /// Run an embedded script and return its stdout
    pub fn run_script<S: AsRef<OsStr>>(&self, script: &str, args: &[S]) -> anyhow::Result<String> {
        let mut cmd = self.command();
        cmd.arg("-c").arg(script).args(args);
        debug!("Running {} -c <script> ({} args)", self.interpreter, args.len());
        let output = cmd.output().map_err(|e| anyhow::anyhow!("cannot run {}: {e}", self.interpreter))?;
        check_output(&output)
    }

    /// Run `python -m module args...` and return its stdout
    pub fn run_module<S: AsRef<OsStr>>(&self, module: &str, args: &[S]) -> anyhow::Result<String> {
        let mut cmd = self.command();
        cmd.arg("-m").arg(module).args(args);
        debug!("Running {} -m {module}", self.interpreter);
        let output = cmd.output().map_err(|e| anyhow::anyhow!("cannot run {}: {e}", self.interpreter))?;
        check_output(&output)
    }

    /// Interpreter version string, e.g. "Python 3.11.6"
    pub fn version(&self) -> anyhow::Result<String> {
        let output = self
            .command()
            .arg("--version")
            .output()
            .map_err(|e| anyhow::anyhow!("cannot run {}: {e}", self.interpreter))?;
        let text = check_output(&output)?;
        // Python 2 printed its version on stderr
        if text.trim().is_empty() {
            Ok(String::from_utf8_lossy(&output.stderr).trim().to_string())
        } else {
            Ok(text.trim().to_string())
        }
    }

    /// Check which toolchain modules import
    #[must_use]
    pub fn probe(&self) -> Vec<ModuleProbe> {
        TOOLCHAIN_MODULES
            .iter()
            .map(|(module, needed_for)| {
                let result = self.run_script(scripts::PROBE_MODULE, &[*module]);
                ModuleProbe {
                    module: (*module).to_string(),
                    needed_for: (*needed_for).to_string(),
                    version: result.as_ref().ok().map(|v| v.trim().to_string()),
                    error: result.err().map(|e| e.to_string()),
                }
            })
            .collect()
    }
}

/// Import check for one Python module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleProbe {
    /// Module name
    pub module: String,
    /// Pipeline stage that needs it
    pub needed_for: String,
    /// Reported version, when the import worked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Import error, when it did not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModuleProbe {
    /// Whether the module imported
    #[must_use]
    pub const fn available(&self) -> bool {
        self.version.is_some()
    }
}

/// Stdout on success; the child's last stderr line as the error otherwise
fn check_output(output: &Output) -> anyhow::Result<String> {
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    match last_error_line(&stderr) {
        Some(line) => anyhow::bail!("{line}"),
        None => anyhow::bail!("python exited with {}", output.status),
    }
}

/// Python tracebacks end with the exception line
fn last_error_line(stderr: &str) -> Option<&str> {
    stderr.lines().map(str::trim).rfind(|line| !line.is_empty())
}
