//! Runtime loader backed by `onnxruntime`

use std::path::Path;

use anyhow::Context;

use super::{PythonRunner, scripts};
use crate::core::models::SessionSignature;
use crate::core::ports::RuntimeLoader;

/// Opens a CPU inference session in a child process
#[derive(Debug, Clone, Default)]
pub struct PythonRuntimeLoader {
    runner: PythonRunner,
}

impl PythonRuntimeLoader {
    /// Create a loader that runs through `runner`
    #[must_use]
    pub const fn new(runner: PythonRunner) -> Self {
        Self { runner }
    }
}

impl RuntimeLoader for PythonRuntimeLoader {
    fn load(&self, graph: &Path) -> anyhow::Result<SessionSignature> {
        let stdout = self.runner.run_script(scripts::RUNTIME_LOAD, &[graph.as_os_str()])?;
        parse_signature(&stdout)
    }
}

/// The loader prints one JSON object; anything before it is library noise
fn parse_signature(stdout: &str) -> anyhow::Result<SessionSignature> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rfind(|line| line.starts_with('{'))
        .context("runtime loader printed no signature")?;
    serde_json::from_str(line).context("runtime loader printed an unreadable signature")
}
