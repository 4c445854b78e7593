//! Graph inliner backed by the `onnx` Python package

use std::path::Path;

use super::{PythonRunner, scripts};
use crate::core::ports::GraphInliner;

/// Inlines external data with `onnx.load` / `onnx.save_model`
#[derive(Debug, Clone, Default)]
pub struct PythonInliner {
    runner: PythonRunner,
}

impl PythonInliner {
    /// Create an inliner that runs through `runner`
    #[must_use]
    pub const fn new(runner: PythonRunner) -> Self {
        Self { runner }
    }
}

impl GraphInliner for PythonInliner {
    fn inline(&self, graph: &Path, target: &Path) -> anyhow::Result<()> {
        self.runner
            .run_script(scripts::INLINE, &[graph.as_os_str(), target.as_os_str()])
            .map(|_| ())
    }
}
